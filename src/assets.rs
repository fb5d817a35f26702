use std::path::Path;

use image::RgbaImage;
use image::imageops::FilterType;

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageRole {
    Logo,
    Signature,
}

impl ImageRole {
    fn describe(self) -> &'static str {
        match self {
            ImageRole::Logo => "logo",
            ImageRole::Signature => "signature",
        }
    }
}

/// A decoded RGBA8 bitmap with non-zero dimensions.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    role: ImageRole,
    pixels: RgbaImage,
}

impl PreparedImage {
    pub fn role(&self) -> ImageRole {
        self.role
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Lanczos resample to exactly `width` x `height` (each at least one pixel).
    pub fn resized(&self, width: u32, height: u32) -> PreparedImage {
        let (w, h) = (width.max(1), height.max(1));
        if (w, h) == (self.width(), self.height()) {
            return self.clone();
        }
        PreparedImage {
            role: self.role,
            pixels: image::imageops::resize(&self.pixels, w, h, FilterType::Lanczos3),
        }
    }

    pub(crate) fn has_transparency(&self) -> bool {
        self.pixels.pixels().any(|p| p.0[3] < 255)
    }
}

/// Decode an uploaded image (PNG or JPEG) into RGBA8.
pub fn prepare_image(bytes: &[u8], role: ImageRole) -> Result<PreparedImage, Error> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| Error::InvalidImage(format!("{} could not be decoded: {e}", role.describe())))?;
    let pixels = decoded.to_rgba8();
    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(Error::InvalidImage(format!(
            "{} has invalid dimensions {}x{}",
            role.describe(),
            pixels.width(),
            pixels.height()
        )));
    }
    log::debug!(
        "prepared {} image {}x{}",
        role.describe(),
        pixels.width(),
        pixels.height()
    );
    Ok(PreparedImage { role, pixels })
}

/// Logo and signature shared by every page of one invocation.
#[derive(Clone, Debug)]
pub struct RenderAssets {
    pub logo: PreparedImage,
    pub signature: PreparedImage,
}

impl RenderAssets {
    pub fn load(logo: &[u8], signature: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            logo: prepare_image(logo, ImageRole::Logo)?,
            signature: prepare_image(signature, ImageRole::Signature)?,
        })
    }

    pub fn from_paths(logo: &Path, signature: &Path) -> Result<Self, Error> {
        let logo = read_asset(logo)?;
        let signature = read_asset(signature)?;
        Self::load(&logo, &signature)
    }
}

fn read_asset(path: &Path) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, path.display()),
        ))
    })
}
