//! Trait for device identification

/// Trait for device identification
///
/// A device is the placement identity of a buffer: two buffers can only be
/// combined into one container when their devices compare equal under
/// [`Device::is_same`].
pub trait Device: Clone + Send + Sync + 'static {
    /// Unique identifier for this device
    fn id(&self) -> usize;

    /// Check if two devices are the same
    fn is_same(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// Human-readable name
    fn name(&self) -> String {
        format!("Device({})", self.id())
    }
}
