//! Placed items: the tagged union of image and text content over a shared
//! geometric frame, plus the JSON wire format used for persistence and
//! backups.

use crate::geometry::Frame;
use kurbo::Size;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Font size all text layout is performed at; the renderer scales the laid
/// out block into the item's frame, so stored metrics stay independent of
/// the frame's pixel size.
pub const REFERENCE_FONT_SIZE: f64 = 64.0;

/// Line height as a multiple of the font size.
pub const TEXT_LINE_HEIGHT: f64 = 1.2;

/// Padding around the text block when a background color is set, in
/// reference units.
pub const TEXT_PADDING: f64 = 16.0;

/// Serialized sentinel for "no background".
const TRANSPARENT: &str = "transparent";

/// Stable identifier for an item: creation-time milliseconds plus a
/// process-unique tiebreak, so ids never collide within a session.
///
/// Stored as a string, but older saves wrote numeric ids, so deserialization
/// accepts JSON numbers as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemId(String);

impl ItemId {
    /// Mint a fresh id.
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Self(format!("{millis}-{:08x}", next_tiebreak()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Counter-seeded splitmix32 mix; unique within the process without pulling
/// in a randomness source.
fn next_tiebreak() -> u32 {
    static COUNTER: AtomicU32 = AtomicU32::new(1);
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut x = counter.wrapping_mul(0x9E37_79B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2_AE35);
    x ^= x >> 16;
    x
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = ItemId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an item id as a string or legacy number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ItemId, E> {
                Ok(ItemId(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ItemId, E> {
                Ok(ItemId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ItemId, E> {
                Ok(ItemId(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<ItemId, E> {
                Ok(ItemId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// RGBA8 color with CSS-style hex formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Returns `None` for the
    /// `transparent` sentinel and anything unparseable.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(TRANSPARENT) {
            return None;
        }
        let hex = value.strip_prefix('#')?;
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::new(r, g, b, 255))
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Self::new(r, g, b, a))
            }
            _ => None,
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Text weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    pub fn as_str(self) -> &'static str {
        match self {
            FontWeight::Normal => "normal",
            FontWeight::Bold => "bold",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(FontWeight::Normal),
            "bold" => Some(FontWeight::Bold),
            _ => None,
        }
    }

    /// Average glyph advance as a fraction of the font size, used when no
    /// font metrics are available. Empirically determined for a typical
    /// sans-serif face.
    pub fn advance_factor(self) -> f64 {
        match self {
            FontWeight::Normal => 0.52,
            FontWeight::Bold => 0.55,
        }
    }
}

/// Kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Image {
        /// Durable encoded form (base64 of the compressed image bytes);
        /// re-decoded by the renderer.
        data: String,
        /// Source the image was imported from, if any. Enables the link
        /// glyph and the open-source gesture.
        url: Option<String>,
    },
    Text {
        text: String,
        color: Rgba,
        /// `None` means no background is painted.
        background: Option<Rgba>,
        weight: FontWeight,
    },
}

/// One placed object on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StoredItem", from = "StoredItem")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub frame: Frame,
    pub kind: ItemKind,
}

impl Item {
    /// Create an image item with a fresh id.
    pub fn image(name: impl Into<String>, frame: Frame, data: String, url: Option<String>) -> Self {
        Self {
            id: ItemId::generate(),
            name: name.into(),
            frame,
            kind: ItemKind::Image { data, url },
        }
    }

    /// Create a text item with a fresh id; the display label is derived
    /// from the content.
    pub fn text(
        frame: Frame,
        text: impl Into<String>,
        color: Rgba,
        background: Option<Rgba>,
        weight: FontWeight,
    ) -> Self {
        let text = text.into();
        Self {
            id: ItemId::generate(),
            name: text_label(&text),
            frame,
            kind: ItemKind::Text {
                text,
                color,
                background,
                weight,
            },
        }
    }

    /// The source URL, for image items that carry one.
    pub fn source_url(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Image { url, .. } => url.as_deref(),
            ItemKind::Text { .. } => None,
        }
    }
}

/// Display label for a text item: the first non-empty line, truncated.
pub fn text_label(text: &str) -> String {
    let first = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");
    if first.is_empty() {
        return "Text".to_string();
    }
    let mut label: String = first.chars().take(24).collect();
    if first.chars().count() > 24 {
        label.push('…');
    }
    label
}

/// Size of the laid-out reference block for a text item, from the
/// approximate metric tables. Used for initial placement and as the layout
/// fallback when no font is available.
pub fn reference_text_size(text: &str, weight: FontWeight, has_background: bool) -> Size {
    let mut line_count = 0usize;
    let mut max_chars = 0usize;
    for line in text.split('\n') {
        line_count += 1;
        max_chars = max_chars.max(line.chars().count());
    }
    let width = max_chars.max(1) as f64 * REFERENCE_FONT_SIZE * weight.advance_factor();
    let height = line_count.max(1) as f64 * REFERENCE_FONT_SIZE * TEXT_LINE_HEIGHT;
    let pad = if has_background {
        2.0 * TEXT_PADDING
    } else {
        0.0
    };
    Size::new(width + pad, height + pad)
}

/// Discriminant in the wire format. Absent in older saves, which only held
/// images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StoredKind {
    #[default]
    Image,
    Text,
}

/// Flat JSON form of an [`Item`], shared by the persistence adapter and
/// backup files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredItem {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    rotation: f64,
    name: String,
    id: ItemId,
    #[serde(default)]
    kind: StoredKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encoded_asset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl From<Item> for StoredItem {
    fn from(item: Item) -> Self {
        let Frame {
            x,
            y,
            width,
            height,
            rotation,
        } = item.frame;
        let mut stored = StoredItem {
            x,
            y,
            width,
            height,
            rotation,
            name: item.name,
            id: item.id,
            kind: StoredKind::Image,
            encoded_asset: None,
            text: None,
            color: None,
            background_color: None,
            font_weight: None,
            url: None,
        };
        match item.kind {
            ItemKind::Image { data, url } => {
                stored.encoded_asset = Some(data);
                stored.url = url;
            }
            ItemKind::Text {
                text,
                color,
                background,
                weight,
            } => {
                stored.kind = StoredKind::Text;
                stored.text = Some(text);
                stored.color = Some(color.to_hex());
                stored.background_color =
                    Some(background.map_or_else(|| TRANSPARENT.to_string(), Rgba::to_hex));
                stored.font_weight = Some(weight.as_str().to_string());
            }
        }
        stored
    }
}

impl From<StoredItem> for Item {
    fn from(stored: StoredItem) -> Self {
        let frame = Frame {
            x: stored.x,
            y: stored.y,
            width: stored.width,
            height: stored.height,
            rotation: stored.rotation,
        };
        // Lenient on payload fields: a save from an older build should still
        // load, with defaults filling the gaps.
        let kind = match stored.kind {
            StoredKind::Image => ItemKind::Image {
                data: stored.encoded_asset.unwrap_or_default(),
                url: stored.url,
            },
            StoredKind::Text => ItemKind::Text {
                text: stored.text.unwrap_or_default(),
                color: stored
                    .color
                    .as_deref()
                    .and_then(Rgba::parse)
                    .unwrap_or(Rgba::BLACK),
                background: stored.background_color.as_deref().and_then(Rgba::parse),
                weight: stored
                    .font_weight
                    .as_deref()
                    .and_then(FontWeight::parse)
                    .unwrap_or_default(),
            },
        };
        Item {
            id: stored.id,
            name: stored.name,
            frame,
            kind,
        }
    }
}
