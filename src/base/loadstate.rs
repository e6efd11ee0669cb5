/// The current state of an in-flight resolution request.
/// This roughly matches the resolution-related subset of net/base/load_states.h
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// The request is idle (not yet started, or already settled).
    #[default]
    Idle,

    /// Waiting for the application's resolve hook to answer.
    WaitingForDelegate,

    /// Resolving the host.
    ResolvingHost,
}
