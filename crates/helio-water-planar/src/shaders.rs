//! WGSL programs behind the lighting, skybox and water effects

use crate::effect::techniques;

pub const SCENE_WGSL: &str = include_str!("shaders/scene.wgsl");
pub const SKYBOX_WGSL: &str = include_str!("shaders/skybox.wgsl");
pub const WATER_WGSL: &str = include_str!("shaders/water.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";

/// Fragment entry point implementing `technique`
pub fn fragment_entry(technique: &str) -> Option<&'static str> {
    match technique {
        techniques::LIGHTING | techniques::SKYBOX => Some("fs_main"),
        techniques::WATER => Some("fs_water"),
        techniques::WATER_REFLECTION_ONLY => Some("fs_water_reflection_only"),
        _ => None,
    }
}

/// Source of the program a technique belongs to
pub fn source(technique: &str) -> Option<&'static str> {
    match technique {
        techniques::LIGHTING => Some(SCENE_WGSL),
        techniques::SKYBOX => Some(SKYBOX_WGSL),
        techniques::WATER | techniques::WATER_REFLECTION_ONLY => Some(WATER_WGSL),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source).unwrap_or_else(|e| panic!("{}", e.emit_to_string(source)));
        naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::empty())
            .validate(&module)
            .unwrap_or_else(|e| panic!("{e:?}"));
        module
    }

    fn entry_points(module: &naga::Module) -> Vec<&str> {
        module.entry_points.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn every_technique_has_a_valid_program() {
        for technique in [
            techniques::LIGHTING,
            techniques::SKYBOX,
            techniques::WATER,
            techniques::WATER_REFLECTION_ONLY,
        ] {
            let module = validate(source(technique).unwrap());
            let entries = entry_points(&module);
            assert!(entries.contains(&VERTEX_ENTRY), "{technique} has no vertex entry");
            assert!(entries.contains(&fragment_entry(technique).unwrap()), "{technique} has no fragment entry");
        }
    }

    #[test]
    fn uniform_block_sizes_match_rust_layout() {
        let cases = [
            (SCENE_WGSL, "ObjectUniforms", std::mem::size_of::<crate::uniforms::ObjectUniforms>()),
            (SKYBOX_WGSL, "SkyboxUniforms", std::mem::size_of::<crate::uniforms::SkyboxUniforms>()),
            (WATER_WGSL, "WaterUniforms", std::mem::size_of::<crate::uniforms::WaterUniforms>()),
        ];
        for (source, name, expected) in cases {
            let module = validate(source);
            let (_, ty) = module
                .types
                .iter()
                .find(|(_, ty)| ty.name.as_deref() == Some(name))
                .unwrap_or_else(|| panic!("{name} missing"));
            match ty.inner {
                naga::TypeInner::Struct { span, .. } => assert_eq!(span as usize, expected, "{name}"),
                ref other => panic!("{name} is {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_technique_has_no_program() {
        assert_eq!(source("Bloom"), None);
        assert_eq!(fragment_entry("Bloom"), None);
    }
}
