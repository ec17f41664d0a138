/// Readiness a registered descriptor is watched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Interest {
    pub(crate) read: bool,
    pub(crate) write: bool,
}

impl Interest {
    /// Returns `true` if neither direction is watched.
    pub(crate) fn is_empty(self) -> bool {
        !self.read && !self.write
    }
}
