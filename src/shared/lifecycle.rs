/// Notifications from the host about the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Foregrounded,
    Backgrounded,
    /// New device language preference, e.g. `vi-VN,en;q=0.8`.
    LocaleChanged(String),
    SignedOut,
}
