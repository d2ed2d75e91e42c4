//! Text sidecar consumed by the wiki's interactive 3D viewer.
//!
//! The viewer only reads the numbers; the surrounding markup is a template
//! with `${name}` placeholders so other wikis can supply their own wrapper.

use chrono::{DateTime, Utc};

use crate::composition::strip::{ComposedStrip, OffsetEntry};
use crate::error::{ConfigError, Result};

/// Placeholders understood by [`Sidecar::render`]
pub const PLACEHOLDERS: [&str; 9] = [
    "url",
    "timestamp",
    "canvas_width",
    "frame_width",
    "frame_height",
    "vertical_steps",
    "offsets",
    "target_dimension",
    "start_frame",
];

/// Default wiki template
pub const DEFAULT_TEMPLATE: &str = concat!(
    "{{#switch: {{{1|}}}\n",
    "  | url = <nowiki>${url}?${timestamp}</nowiki>\n",
    "  | map = \n",
    "${canvas_width}, ${frame_width}, ${frame_height}, ${vertical_steps}, ${offsets}\n",
    "  | height = ${target_dimension}\n",
    "  | startframe = ${start_frame}\n",
    "  }}<noinclude>{{3D viewer}}[[Category:3D model images]]",
);

/// Cache-busting timestamp format
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Numeric payload of the sidecar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidecar {
    pub url: String,
    pub timestamp: String,
    pub canvas_width: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub vertical_steps: u32,
    pub offsets: Vec<OffsetEntry>,
    pub target_dimension: u32,
    pub start_frame: u32,
}

impl Sidecar {
    pub fn from_strip(
        strip: &ComposedStrip,
        vertical_steps: u32,
        target_dimension: u32,
        url: &str,
        start_frame: u32,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.to_string(),
            timestamp: generated_at.format(TIMESTAMP_FORMAT).to_string(),
            canvas_width: strip.canvas_width(),
            frame_width: strip.frame_width,
            frame_height: strip.frame_height,
            vertical_steps,
            offsets: strip.offsets.clone(),
            target_dimension,
            start_frame,
        }
    }

    /// Every offset entry flattened and `", "`-joined
    pub fn offsets_list(&self) -> String {
        self.offsets
            .iter()
            .flat_map(|entry| entry.values())
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn value_of(&self, placeholder: &str) -> Option<String> {
        let value = match placeholder {
            "url" => self.url.clone(),
            "timestamp" => self.timestamp.clone(),
            "canvas_width" => self.canvas_width.to_string(),
            "frame_width" => self.frame_width.to_string(),
            "frame_height" => self.frame_height.to_string(),
            "vertical_steps" => self.vertical_steps.to_string(),
            "offsets" => self.offsets_list(),
            "target_dimension" => self.target_dimension.to_string(),
            "start_frame" => self.start_frame.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Substitute every placeholder in `template`
    pub fn render(&self, template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len() + 16 * self.offsets.len());
        for segment in parse_template(template)? {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    // parse_template only yields known names
                    out.push_str(&self.value_of(name).unwrap_or_default())
                }
            }
        }
        Ok(out)
    }
}

/// Reject templates with unknown or unterminated placeholders
pub fn check_template(template: &str) -> Result<()> {
    parse_template(template).map(|_| ())
}

enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

fn parse_template(template: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        if start > 0 {
            segments.push(Segment::Text(&rest[..start]));
        }
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| invalid_template(&rest[start..]))?;
        let name = &after[..end];
        if !PLACEHOLDERS.contains(&name) {
            return Err(invalid_template(&rest[start..start + end + 3]));
        }
        segments.push(Segment::Placeholder(name));
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }

    Ok(segments)
}

fn invalid_template(fragment: &str) -> crate::error::StitchError {
    ConfigError::InvalidValue {
        key: "sidecar.template".to_string(),
        value: fragment.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Sidecar {
        Sidecar {
            url: "https://example.org/weapon.png".to_string(),
            timestamp: "20240102030405".to_string(),
            canvas_width: 655,
            frame_width: 280,
            frame_height: 280,
            vertical_steps: 3,
            offsets: vec![
                OffsetEntry { offset: 0, height: 233, left_crop: 15 },
                OffsetEntry { offset: 248, height: 280, left_crop: 0 },
            ],
            target_dimension: 280,
            start_frame: 16,
        }
    }

    #[test]
    fn test_offsets_are_flattened_in_order() {
        assert_eq!(sample().offsets_list(), "0, 233, 15, 248, 280, 0");
    }

    #[test]
    fn test_default_template() {
        let text = sample().render(DEFAULT_TEMPLATE).unwrap();

        let expected = [
            "{{#switch: {{{1|}}}",
            "  | url = <nowiki>https://example.org/weapon.png?20240102030405</nowiki>",
            "  | map = ",
            "655, 280, 280, 3, 0, 233, 15, 248, 280, 0",
            "  | height = 280",
            "  | startframe = 16",
            "  }}<noinclude>{{3D viewer}}[[Category:3D model images]]",
        ]
        .join("\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn test_custom_template() {
        let text = sample().render("${frame_width}x${frame_height}|${offsets}|$5 {x}").unwrap();
        assert_eq!(text, "280x280|0, 233, 15, 248, 280, 0|$5 {x}");
    }

    #[test]
    fn test_bad_templates_rejected() {
        assert!(check_template(DEFAULT_TEMPLATE).is_ok());
        assert!(check_template("${width}").is_err());
        assert!(check_template("map = ${offsets").is_err());
    }

    #[test]
    fn test_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(at.format(TIMESTAMP_FORMAT).to_string(), "20240102030405");
    }
}
