use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Super-resolution models understood by the upscale tool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpscaleModel {
    #[serde(rename = "realesr-animevideov3")]
    AnimeVideoV3,
    #[default]
    #[serde(rename = "realesrgan-x4plus")]
    X4Plus,
    #[serde(rename = "realesrgan-x4plus-anime")]
    X4PlusAnime,
}

impl UpscaleModel {
    pub const ALL: [Self; 3] = [Self::AnimeVideoV3, Self::X4Plus, Self::X4PlusAnime];

    /// Identifier passed to the tool with `-n`.
    pub fn id(&self) -> &'static str {
        match self {
            Self::AnimeVideoV3 => "realesr-animevideov3",
            Self::X4Plus => "realesrgan-x4plus",
            Self::X4PlusAnime => "realesrgan-x4plus-anime",
        }
    }

    /// Models trained for a single 4x factor ignore the requested scale.
    pub fn is_fixed_x4(&self) -> bool {
        self.id().contains("x4")
    }
}

impl std::fmt::Display for UpscaleModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for UpscaleModel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownUpscaleModel(s.to_string()))
    }
}

/// Network architecture of a face-restoration model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestoreArch {
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "bilinear")]
    Bilinear,
    #[serde(rename = "clean")]
    Clean,
    #[serde(rename = "RestoreFormer")]
    RestoreFormer,
}

impl RestoreArch {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Bilinear => "bilinear",
            Self::Clean => "clean",
            Self::RestoreFormer => "RestoreFormer",
        }
    }
}

impl std::fmt::Display for RestoreArch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Face-restoration model weights published as release assets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestoreModel {
    #[default]
    #[serde(rename = "GFPGANCleanv1-NoCE-C2")]
    CleanV1NoCeC2,
    #[serde(rename = "GFPGANv1.3")]
    V1_3,
    #[serde(rename = "GFPGANv1.4")]
    V1_4,
    #[serde(rename = "RestoreFormer")]
    RestoreFormer,
}

impl RestoreModel {
    pub const ALL: [Self; 4] = [
        Self::CleanV1NoCeC2,
        Self::V1_3,
        Self::V1_4,
        Self::RestoreFormer,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::CleanV1NoCeC2 => "GFPGANCleanv1-NoCE-C2",
            Self::V1_3 => "GFPGANv1.3",
            Self::V1_4 => "GFPGANv1.4",
            Self::RestoreFormer => "RestoreFormer",
        }
    }

    /// Fixed download location of the weights.
    pub fn url(&self) -> &'static str {
        match self {
            Self::CleanV1NoCeC2 => {
                "https://github.com/TencentARC/GFPGAN/releases/download/v0.2.0/GFPGANCleanv1-NoCE-C2.pth"
            }
            Self::V1_3 => {
                "https://github.com/TencentARC/GFPGAN/releases/download/v1.3.0/GFPGANv1.3.pth"
            }
            Self::V1_4 => {
                "https://github.com/TencentARC/GFPGAN/releases/download/v1.3.0/GFPGANv1.4.pth"
            }
            Self::RestoreFormer => {
                "https://github.com/TencentARC/GFPGAN/releases/download/v1.3.4/RestoreFormer.pth"
            }
        }
    }

    /// Local cache file name.
    pub fn file_name(&self) -> String {
        format!("{}.pth", self.id())
    }

    pub fn arch(&self) -> RestoreArch {
        match self {
            Self::RestoreFormer => RestoreArch::RestoreFormer,
            Self::CleanV1NoCeC2 | Self::V1_3 | Self::V1_4 => RestoreArch::Clean,
        }
    }

    pub fn channel_multiplier(&self) -> u32 {
        2
    }
}

impl std::fmt::Display for RestoreModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for RestoreModel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownRestoreModel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x4_models_are_fixed_scale() {
        assert!(UpscaleModel::X4Plus.is_fixed_x4());
        assert!(UpscaleModel::X4PlusAnime.is_fixed_x4());
        assert!(!UpscaleModel::AnimeVideoV3.is_fixed_x4());
    }

    #[test]
    fn test_restore_former_arch() {
        assert_eq!(RestoreModel::RestoreFormer.arch(), RestoreArch::RestoreFormer);
        assert_eq!(RestoreModel::V1_4.arch(), RestoreArch::Clean);
        assert_eq!(RestoreModel::V1_3.channel_multiplier(), 2);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let m: RestoreModel = "gfpganv1.4".parse().unwrap();
        assert_eq!(m, RestoreModel::V1_4);
        assert!("GFPGANv9".parse::<RestoreModel>().is_err());
    }
}
