//! Built-in collections for the main workflow personas

/// Available presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Animation hand-off
    Animation,
    /// Model publishing
    Modelling,
    /// Rig publishing
    Rigging,
    /// Shading and lighting
    LookDev,
}

impl Preset {
    /// Get preset from name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "animation" | "anim" => Some(Self::Animation),
            "modelling" | "modeling" | "model" => Some(Self::Modelling),
            "rigging" | "rig" => Some(Self::Rigging),
            "look-dev" | "lookdev" | "shading" => Some(Self::LookDev),
            _ => None,
        }
    }

    /// Get the name of the preset
    pub fn name(&self) -> &'static str {
        match self {
            Self::Animation => "animation",
            Self::Modelling => "modelling",
            Self::Rigging => "rigging",
            Self::LookDev => "look-dev",
        }
    }

    /// Get a description of the preset
    pub fn description(&self) -> &'static str {
        match self {
            Self::Animation => "Animation curves and scene hygiene",
            Self::Modelling => "Geometry, UVs, shading assignment and render stats",
            Self::Rigging => "Rig hygiene, skinning and render stats",
            Self::LookDev => "Shaders, textures, render layers and render stats",
        }
    }

    /// Ordered category list of the collection
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            Self::Animation => &["Animation", "Scene"],
            Self::Modelling => &[
                "Modelling",
                "Geometry",
                "UV",
                "Shaders",
                "Render Stats",
                "Scene",
            ],
            Self::Rigging => &["Rigging", "Skinning", "Shaders", "Render Stats", "Scene"],
            Self::LookDev => &[
                "Shaders",
                "Textures",
                "UV",
                "Render Layers",
                "Render Stats",
                "Scene",
            ],
        }
    }

    /// Every preset in presentation order
    pub fn all() -> [Self; 4] {
        [Self::Animation, Self::Modelling, Self::Rigging, Self::LookDev]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_from_name() {
        assert_eq!(Preset::from_name("animation").unwrap(), Preset::Animation);
        assert_eq!(Preset::from_name("Modeling").unwrap(), Preset::Modelling);
        assert_eq!(Preset::from_name("rig").unwrap(), Preset::Rigging);
        assert_eq!(Preset::from_name("lookdev").unwrap(), Preset::LookDev);
        assert!(Preset::from_name("compositing").is_none());
    }

    #[test]
    fn test_preset_name_round_trips() {
        for preset in Preset::all() {
            assert_eq!(Preset::from_name(preset.name()), Some(preset));
        }
    }

    #[test]
    fn test_every_collection_ends_with_scene() {
        for preset in Preset::all() {
            assert_eq!(preset.categories().last(), Some(&"Scene"));
        }
    }
}
