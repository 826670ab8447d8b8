// The four concrete resource kinds and their display projections.

pub mod containers;
pub mod images;
pub mod networks;
pub mod volumes;

pub use containers::{ContainerCounts, ContainerManager, ContainerRow, Containers};
pub use images::{ImageCounts, ImageManager, ImageRow, Images};
pub use networks::{NetworkCounts, NetworkManager, NetworkRow, Networks};
pub use volumes::{VolumeCounts, VolumeManager, VolumeRow, Volumes};
