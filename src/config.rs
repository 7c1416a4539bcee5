use std::path::Path;

use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;
use tower_lsp::lsp_types::ClientCapabilities;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// Extension of the component documents this server manages
    pub component_extension: String,
    /// Extension appended to derive a shadow document's virtual identifier
    pub shadow_extension: String,
    pub hover: bool,
    pub diagnostics: bool,
    /// Emit usage-check statements for markup expressions
    pub template_checks: bool,
    /// Emit the ambient runtime declarations at the top of shadow documents
    pub prelude: bool,
}

impl Settings {
    pub fn new(root_dir: &Path, capabilities: &ClientCapabilities) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/umbra/settings");
        let settings = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.umbra",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .set_default("component_extension", "sfc")?
            .set_default("shadow_extension", "ts")?
            .set_default("hover", true)?
            .set_default("diagnostics", true)?
            .set_default("template_checks", true)?
            .set_default("prelude", true)?
            .set_override_option(
                "hover",
                capabilities.text_document.as_ref().and_then(|it| {
                    match it.hover.is_none() {
                        true => Some(false),
                        false => None,
                    }
                }),
            )?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let settings = settings.try_deserialize::<Settings>()?;

        anyhow::Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            component_extension: "sfc".to_string(),
            shadow_extension: "ts".to_string(),
            hover: true,
            diagnostics: true,
            template_checks: true,
            prelude: true,
        }
    }
}
