//! Driver capability records.

use serde::Serialize;

/// Kind of volume a pool may host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeType {
    /// User-created custom volume.
    Custom,
    /// Unpacked image used to seed instances.
    Image,
    /// Container root filesystem.
    Container,
    /// Virtual machine disk.
    VirtualMachine,
}

/// What a driver variant supports.
///
/// Records are built as constants by each driver and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Info {
    /// Driver name.
    pub name: &'static str,
    /// Schema version of the driver.
    pub version: &'static str,
    /// Images can be turned into volumes without a full copy.
    pub optimized_images: bool,
    /// Copies keep inode numbers.
    pub preserves_inodes: bool,
    /// Storage is not local to the host.
    pub remote: bool,
    /// Volume kinds the pool can host.
    pub volume_types: &'static [VolumeType],
    /// Volumes are block devices rather than directory trees.
    pub block_backing: bool,
    /// Quotas can change while the volume is mounted.
    pub running_quota_resize: bool,
    /// Snapshots can freeze I/O without unmounting.
    pub running_snapshot_freeze: bool,
}

impl Info {
    /// Whether the driver can host volumes of this kind.
    #[must_use]
    pub fn supports(&self, volume_type: VolumeType) -> bool {
        self.volume_types.contains(&volume_type)
    }
}
