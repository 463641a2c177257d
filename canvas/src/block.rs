//! Block model: the typed entities placed on the canvas.
//!
//! A [`Block`] is a shared geometric envelope (`id`, `position`, `size`) plus a
//! [`BlockBody`] that carries the per-variant styles and content. The body is a
//! closed sum type, so every renderer and mutator matches it exhaustively.
//!
//! Style and content structs name the keys the editor understands and keep every
//! other key in a passthrough `extra` map, so layouts written by newer clients or by
//! the AI collaborator round-trip without losing data.
//!
//! Data enters this layer from JSON (layout store, AI responses, drag payloads) and
//! from the factory ([`create_block`]). Mutation happens by building new values via
//! [`Block::patched`]; blocks are never edited in place once they are in a scene.

#[cfg(test)]
#[path = "block_test.rs"]
mod block_test;

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::consts::MIN_BLOCK_SIZE;
use crate::geometry::normalize_degrees;

/// Passthrough bag for style or content keys the model does not name.
pub type Extra = Map<String, Value>;

/// Opaque unique identifier for a block.
///
/// Freshly created blocks get a UUID v4; ids loaded from a layout are kept
/// verbatim whatever their shape (`"header-1"`, `"block-…"`, UUIDs).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Generate a new random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Top-left anchor of a block in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// This position shifted by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// Width and height of a block in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp both dimensions to [`MIN_BLOCK_SIZE`].
    #[must_use]
    pub fn floored(self) -> Self {
        Self { width: self.width.max(MIN_BLOCK_SIZE), height: self.height.max(MIN_BLOCK_SIZE) }
    }
}

/// The closed set of block variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Image,
    Rectangle,
    Section,
}

impl BlockKind {
    /// Wire name of the variant (`"text"`, `"image"`, ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Rectangle => "rectangle",
            Self::Section => "section",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================
// Styles
// =============================================================

/// Style keys shared by every variant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonStyles {
    /// Opacity in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Clockwise rotation in degrees, normalized into `[0, 360)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl CommonStyles {
    /// Bring rotation and opacity back into their valid ranges.
    fn normalize(&mut self) {
        if let Some(rotation) = self.rotation {
            self.rotation = Some(normalize_degrees(rotation));
        }
        if let Some(opacity) = self.opacity {
            self.opacity = Some(if opacity.is_finite() { opacity.clamp(0.0, 1.0) } else { 1.0 });
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyles {
    #[serde(flatten)]
    pub common: CommonStyles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageStyles {
    #[serde(flatten)]
    pub common: CommonStyles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_fit: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RectangleStyles {
    #[serde(flatten)]
    pub common: CommonStyles,
    #[serde(flatten)]
    pub extra: Extra,
}

/// CSS font weight, either numeric (`700`) or a keyword (`"bold"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontWeight {
    Numeric(f64),
    Keyword(String),
}

/// Main axis of a section's stack layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionStyles {
    #[serde(flatten)]
    pub common: CommonStyles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align_items: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justify_content: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

// =============================================================
// Content
// =============================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextContent {
    pub text: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageContent {
    pub src: String,
    pub alt: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

// =============================================================
// Block
// =============================================================

/// Variant-specific part of a block, tagged on the wire by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockBody {
    Text {
        #[serde(default)]
        styles: TextStyles,
        #[serde(default)]
        content: TextContent,
    },
    Image {
        #[serde(default)]
        styles: ImageStyles,
        #[serde(default)]
        content: ImageContent,
    },
    Rectangle {
        #[serde(default)]
        styles: RectangleStyles,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        content: Extra,
    },
    Section {
        #[serde(default)]
        styles: SectionStyles,
        #[serde(default)]
        content: SectionContent,
        /// Child blocks, positioned relative to this section's top-left corner.
        #[serde(default)]
        children: Vec<Arc<Block>>,
    },
}

impl BlockBody {
    /// Which variant this body is.
    #[must_use]
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Text { .. } => BlockKind::Text,
            Self::Image { .. } => BlockKind::Image,
            Self::Rectangle { .. } => BlockKind::Rectangle,
            Self::Section { .. } => BlockKind::Section,
        }
    }

    /// Style keys shared by every variant.
    #[must_use]
    pub fn common(&self) -> &CommonStyles {
        match self {
            Self::Text { styles, .. } => &styles.common,
            Self::Image { styles, .. } => &styles.common,
            Self::Rectangle { styles, .. } => &styles.common,
            Self::Section { styles, .. } => &styles.common,
        }
    }

    fn common_mut(&mut self) -> &mut CommonStyles {
        match self {
            Self::Text { styles, .. } => &mut styles.common,
            Self::Image { styles, .. } => &mut styles.common,
            Self::Rectangle { styles, .. } => &mut styles.common,
            Self::Section { styles, .. } => &mut styles.common,
        }
    }
}

/// A positioned, styled, typed unit of content on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub position: Position,
    pub size: Size,
    #[serde(flatten)]
    pub body: BlockBody,
}

impl Block {
    #[must_use]
    pub fn kind(&self) -> BlockKind {
        self.body.kind()
    }

    /// Rotation in degrees, `0.0` when unset.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.body.common().rotation.unwrap_or(0.0)
    }

    /// Opacity, `1.0` when unset.
    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.body.common().opacity.unwrap_or(1.0)
    }

    /// Child blocks; empty for every variant except sections.
    #[must_use]
    pub fn children(&self) -> &[Arc<Block>] {
        match &self.body {
            BlockBody::Section { children, .. } => children,
            BlockBody::Text { .. } | BlockBody::Image { .. } | BlockBody::Rectangle { .. } => &[],
        }
    }

    /// Text of a text block.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            BlockBody::Text { content, .. } => Some(&content.text),
            _ => None,
        }
    }

    /// A deep copy of this block where it and every descendant get a fresh id.
    #[must_use]
    pub fn with_fresh_ids(&self) -> Block {
        let mut copy = self.clone();
        copy.id = BlockId::generate();
        if let BlockBody::Section { children, .. } = &mut copy.body {
            for child in children.iter_mut() {
                *child = Arc::new(child.with_fresh_ids());
            }
        }
        copy
    }

    /// Build a new block with `patch` merged in.
    ///
    /// `position` and `size` merge per axis; `styles` and `content` merge per key,
    /// with `null` removing a key. The result keeps its size above the floor and its
    /// rotation and opacity in range.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] if a merged map no longer fits this variant's typed
    /// schema, or if `children` is set on a non-section block.
    pub fn patched(&self, patch: &BlockPatch) -> Result<Block, PayloadError> {
        let mut next = self.clone();

        if let Some(pos) = patch.position {
            next.position = Position::new(pos.x.unwrap_or(next.position.x), pos.y.unwrap_or(next.position.y));
        }
        if let Some(size) = patch.size {
            next.size = Size::new(size.width.unwrap_or(next.size.width), size.height.unwrap_or(next.size.height)).floored();
        }

        let kind = next.kind();
        match &mut next.body {
            BlockBody::Text { styles, content } => {
                merge_into(styles, patch.styles.as_ref(), kind)?;
                merge_into(content, patch.content.as_ref(), kind)?;
            }
            BlockBody::Image { styles, content } => {
                merge_into(styles, patch.styles.as_ref(), kind)?;
                merge_into(content, patch.content.as_ref(), kind)?;
            }
            BlockBody::Rectangle { styles, content } => {
                merge_into(styles, patch.styles.as_ref(), kind)?;
                if let Some(incoming) = &patch.content {
                    merge_keys(content, incoming);
                }
            }
            BlockBody::Section { styles, content, children } => {
                merge_into(styles, patch.styles.as_ref(), kind)?;
                merge_into(content, patch.content.as_ref(), kind)?;
                if let Some(replacement) = &patch.children {
                    children.clone_from(replacement);
                }
            }
        }
        if patch.children.is_some() && kind != BlockKind::Section {
            return Err(PayloadError::ChildrenOnLeaf(kind));
        }

        next.body.common_mut().normalize();
        Ok(next)
    }
}

fn merge_keys(target: &mut Extra, incoming: &Extra) {
    for (k, v) in incoming {
        if v.is_null() {
            target.remove(k);
        } else {
            target.insert(k.clone(), v.clone());
        }
    }
}

/// Merge `incoming` into a typed map-like value by round-tripping it through JSON.
fn merge_into<T>(target: &mut T, incoming: Option<&Extra>, kind: BlockKind) -> Result<(), PayloadError>
where
    T: Serialize + DeserializeOwned,
{
    let Some(incoming) = incoming else {
        return Ok(());
    };
    let mut value = serde_json::to_value(&*target)?;
    if !value.is_object() {
        value = Value::Object(Map::new());
    }
    if let Some(existing) = value.as_object_mut() {
        merge_keys(existing, incoming);
    }
    *target = serde_json::from_value(value).map_err(|e| PayloadError::InvalidPatch { kind, reason: e.to_string() })?;
    Ok(())
}

// =============================================================
// Patches and payloads
// =============================================================

/// Per-axis position update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

/// Per-axis size update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SizePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Sparse update for a block. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<SizePatch>,
    /// Style keys to merge or remove (null values delete keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<Extra>,
    /// Content keys to merge or remove (null values delete keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Extra>,
    /// Replacement child list; sections only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Arc<Block>>>,
}

impl BlockPatch {
    /// Patch that sets both size axes.
    #[must_use]
    pub fn size(size: Size) -> Self {
        Self { size: Some(SizePatch { width: Some(size.width), height: Some(size.height) }), ..Self::default() }
    }

    /// Patch that merges the given style keys.
    #[must_use]
    pub fn styles(styles: Extra) -> Self {
        Self { styles: Some(styles), ..Self::default() }
    }

    /// Patch that merges the given content keys.
    #[must_use]
    pub fn content(content: Extra) -> Self {
        Self { content: Some(content), ..Self::default() }
    }

    /// Patch that sets only the rotation style.
    #[must_use]
    pub fn rotation(degrees: f64) -> Self {
        let mut styles = Extra::new();
        styles.insert("rotation".into(), Value::from(degrees));
        Self::styles(styles)
    }
}

/// Payload carried by a toolbar drag onto the canvas: `{"type": "<kind>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropPayload {
    #[serde(rename = "type")]
    pub kind: BlockKind,
}

impl DropPayload {
    /// Parse a serialized drag payload.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Json`] if the payload is not valid JSON or names an
    /// unknown block type.
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Errors raised when external data does not fit the block model.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("patch does not fit a {kind} block: {reason}")]
    InvalidPatch { kind: BlockKind, reason: String },

    #[error("children can only be set on section blocks, not {0}")]
    ChildrenOnLeaf(BlockKind),

    #[error("rewritten text is empty")]
    EmptyText,

    #[error("block {0} is not a text block")]
    NotText(BlockId),
}

// =============================================================
// Factory
// =============================================================

/// Placeholder image used by freshly created image blocks.
pub const PLACEHOLDER_IMAGE_SRC: &str = "https://placehold.co/400x400";

/// Text shown by freshly created text blocks.
pub const DEFAULT_TEXT: &str = "Double click to edit";

/// Create a new block of `kind` at `position` with a fresh id and default geometry,
/// styles and content.
#[must_use]
pub fn create_block(kind: BlockKind, position: Position) -> Block {
    let (size, body) = match kind {
        BlockKind::Text => (
            Size::new(200.0, 50.0),
            BlockBody::Text {
                styles: TextStyles {
                    font_size: Some(16.0),
                    font_weight: Some(FontWeight::Numeric(400.0)),
                    color: Some("#000000".into()),
                    text_align: Some("left".into()),
                    line_height: Some(1.5),
                    ..TextStyles::default()
                },
                content: TextContent { text: DEFAULT_TEXT.into(), extra: Extra::new() },
            },
        ),
        BlockKind::Image => (
            Size::new(200.0, 200.0),
            BlockBody::Image {
                styles: ImageStyles {
                    common: CommonStyles { border_radius: Some(0.0), ..CommonStyles::default() },
                    object_fit: Some("cover".into()),
                    extra: Extra::new(),
                },
                content: ImageContent {
                    src: PLACEHOLDER_IMAGE_SRC.into(),
                    alt: "Placeholder image".into(),
                    extra: Extra::new(),
                },
            },
        ),
        BlockKind::Section => (
            Size::new(400.0, 300.0),
            BlockBody::Section {
                styles: SectionStyles {
                    common: CommonStyles {
                        background_color: Some("#f3f4f6".into()),
                        border_radius: Some(8.0),
                        ..CommonStyles::default()
                    },
                    direction: Some(Direction::Vertical),
                    gap: Some(16.0),
                    padding: Some(16.0),
                    align_items: Some("start".into()),
                    justify_content: Some("start".into()),
                    extra: Extra::new(),
                },
                content: SectionContent::default(),
                children: Vec::new(),
            },
        ),
        BlockKind::Rectangle => (
            Size::new(100.0, 100.0),
            BlockBody::Rectangle {
                styles: RectangleStyles {
                    common: CommonStyles {
                        background_color: Some("#3b82f6".into()),
                        border_radius: Some(8.0),
                        opacity: Some(1.0),
                        ..CommonStyles::default()
                    },
                    extra: Extra::new(),
                },
                content: Extra::new(),
            },
        ),
    };

    Block { id: BlockId::generate(), position, size, body }
}
