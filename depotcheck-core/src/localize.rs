use anyhow::{anyhow, Result};
use fluent_bundle::{FluentArgs, FluentBundle, FluentResource, FluentValue};
use unic_langid::LanguageIdentifier;

/// Anything that can turn a message code plus named args into text.
pub trait Localizer {
    fn msg(&self, code: &str, args: &[(&str, &str)]) -> String;
}

/// Fluent-based localizer with built-in resources.
pub struct FluentLoc {
    bundle: FluentBundle<FluentResource>,
}

impl FluentLoc {
    /// Create a localizer using built-in `.ftl` strings (see ../i18n).
    pub fn builtin(lang: &str) -> Result<Self> {
        let langid: LanguageIdentifier = match lang.parse() {
            Ok(id) => id,
            Err(_) => "en-GB".parse().map_err(|e| anyhow!("language id: {:?}", e))?,
        };

        let ftl_src = match lang {
            "en-GB" | "en" => include_str!("../i18n/en-GB.ftl"),
            _ => include_str!("../i18n/en-GB.ftl"),
        };

        let res = FluentResource::try_new(ftl_src.to_owned())
            .map_err(|(_, errs)| anyhow!("invalid FTL resource: {:?}", errs))?;

        let mut bundle = FluentBundle::new(vec![langid]);
        // No Unicode isolation marks around placeables; output is plain text.
        bundle.set_use_isolating(false);
        bundle
            .add_resource(res)
            .map_err(|errs| anyhow!("add FTL resource: {:?}", errs))?;
        Ok(Self { bundle })
    }
}

impl Localizer for FluentLoc {
    /// Returns the code itself if not found.
    fn msg(&self, code: &str, args: &[(&str, &str)]) -> String {
        let Some(msg) = self.bundle.get_message(code) else {
            return code.to_string();
        };
        let Some(pattern) = msg.value() else {
            return code.to_string();
        };

        let mut fa = FluentArgs::new();
        for (k, v) in args {
            fa.set(*k, FluentValue::from(*v));
        }

        let mut errs = vec![];
        let s = self.bundle.format_pattern(pattern, Some(&fa), &mut errs).to_string();

        if errs.is_empty() {
            s
        } else {
            code.to_string()
        }
    }
}

/// Returns message codes unchanged.
pub struct NoopLoc;

impl Localizer for NoopLoc {
    fn msg(&self, code: &str, _args: &[(&str, &str)]) -> String {
        code.to_string()
    }
}
