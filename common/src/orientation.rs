use serde::Deserialize;

/// Physical orientation of the capture device, as configured or reported by
/// the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceOrientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// EXIF orientation of the image data handed to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExifOrientation {
    Up,
    UpMirrored,
    Down,
    Left,
}

impl DeviceOrientation {
    /// EXIF orientation for a back-camera frame captured at this device
    /// orientation. Landscape-left puts the sensor's top edge on the right,
    /// hence the mirrored mapping.
    pub fn exif(self) -> ExifOrientation {
        match self {
            DeviceOrientation::Portrait => ExifOrientation::Up,
            DeviceOrientation::PortraitUpsideDown => ExifOrientation::Left,
            DeviceOrientation::LandscapeLeft => ExifOrientation::UpMirrored,
            DeviceOrientation::LandscapeRight => ExifOrientation::Down,
        }
    }
}

impl ExifOrientation {
    /// Numeric EXIF orientation tag (TIFF 274).
    pub fn tag(self) -> u8 {
        match self {
            ExifOrientation::Up => 1,
            ExifOrientation::UpMirrored => 2,
            ExifOrientation::Down => 3,
            ExifOrientation::Left => 8,
        }
    }
}
