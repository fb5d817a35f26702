use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    DrawingNumber,
    Title,
    Client,
    Project,
    WorkOrder,
    Contractor,
    Consultant,
    Submitted,
    Checked,
    Approved,
}

/// Row order of the title block, top to bottom.
pub const FIELDS: [Field; 10] = [
    Field::DrawingNumber,
    Field::Title,
    Field::Client,
    Field::Project,
    Field::WorkOrder,
    Field::Contractor,
    Field::Consultant,
    Field::Submitted,
    Field::Checked,
    Field::Approved,
];

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::DrawingNumber => "DR. NO.",
            Field::Title => "TITLE",
            Field::Client => "CLIENT",
            Field::Project => "PROJECT",
            Field::WorkOrder => "WORK ORDER REF",
            Field::Contractor => "CONTRACTOR NAME",
            Field::Consultant => "CONSULTANT NAME",
            Field::Submitted => "SUBMITTED BY",
            Field::Checked => "CHECKED BY",
            Field::Approved => "APPROVED BY",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Field::DrawingNumber => "drno",
            Field::Title => "title",
            Field::Client => "client",
            Field::Project => "project",
            Field::WorkOrder => "workorder",
            Field::Contractor => "contractor",
            Field::Consultant => "consultant",
            Field::Submitted => "submitted",
            Field::Checked => "checked",
            Field::Approved => "approved",
        }
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FIELDS
            .iter()
            .copied()
            .find(|f| f.key() == s.trim())
            .ok_or_else(|| format!("unknown field key: {s}"))
    }
}

/// Free-text value per field. Missing entries read as empty.
#[derive(Clone, Debug, Default)]
pub struct FieldValues {
    values: HashMap<Field, String>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn is_visible(&self, field: Field) -> bool {
        !self.get(field).trim().is_empty()
    }

    /// Fields with a non-blank value, in row order.
    pub fn visible_fields(&self) -> impl Iterator<Item = Field> + '_ {
        FIELDS.iter().copied().filter(|f| self.is_visible(*f))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Placement {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Footer,
}

impl Placement {
    /// Bottom anchors push overlapped content upward; top anchors grow into free space.
    pub fn reflows(self) -> bool {
        matches!(
            self,
            Placement::BottomLeft | Placement::BottomRight | Placement::Footer
        )
    }
}

impl FromStr for Placement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top-left" => Ok(Placement::TopLeft),
            "top-right" => Ok(Placement::TopRight),
            "bottom-left" => Ok(Placement::BottomLeft),
            "bottom-right" | "corner" => Ok(Placement::BottomRight),
            "footer" => Ok(Placement::Footer),
            other => Err(format!(
                "unknown placement '{other}' (expected top-left, top-right, bottom-left, bottom-right, corner or footer)"
            )),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Placement::TopLeft => "top-left",
            Placement::TopRight => "top-right",
            Placement::BottomLeft => "bottom-left",
            Placement::BottomRight => "bottom-right",
            Placement::Footer => "footer",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Page-space rectangle: origin at the top-left corner, y grows downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// True when the two rectangles share a region of non-zero area.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x0 < other.x1
            && other.x0 < self.x1
            && self.y0 < other.y1
            && other.y0 < self.y1
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x0 + dx, self.y0 + dy, self.x1 + dx, self.y1 + dy)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }
}

pub type Rgb = [f32; 3];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// A unit of text already laid out on the page.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentBlock {
    pub rect: Rect,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProjectRowSizing {
    /// Fixed-height project row; the value is drawn as an ordinary textbox.
    Fixed(f32),
    /// Project text is pre-wrapped; the row is one base row per line.
    WrappedLines,
}

/// Space kept between wrapped text and its column edge unless a style says otherwise.
pub(crate) const DEFAULT_WRAP_SAFETY: f32 = 5.0;

/// Geometry and colors of the stamped table.
#[derive(Clone, Debug)]
pub struct StampStyle {
    pub margin: f32,
    pub row_height: f32,
    pub signature_row_height: f32,
    pub label_col_width: f32,
    pub content_col_width: f32,
    pub project_col_width: f32,
    pub signature_col_width: f32,
    /// Space kept free for the signature at the right end of the name cell.
    pub signature_reserve: f32,
    pub font_size: f32,
    pub accent_color: Rgb,
    pub text_color: Rgb,
    pub background: Rgb,
    pub separator_width: f32,
    pub border_width: f32,
    pub wrap_safety: f32,
    pub top_gap: f32,
    pub project_rows: ProjectRowSizing,
}

impl Default for StampStyle {
    fn default() -> Self {
        Self {
            margin: 10.0,
            row_height: 18.0,
            signature_row_height: 50.0,
            label_col_width: 90.0,
            content_col_width: 180.0,
            project_col_width: 260.0,
            signature_col_width: 260.0,
            signature_reserve: 60.0,
            font_size: 7.8,
            accent_color: [0.53, 0.81, 0.98],
            text_color: [0.0, 0.0, 0.0],
            background: [1.0, 1.0, 1.0],
            separator_width: 0.8,
            border_width: 1.0,
            wrap_safety: DEFAULT_WRAP_SAFETY,
            top_gap: 5.0,
            project_rows: ProjectRowSizing::WrappedLines,
        }
    }
}

impl StampStyle {
    /// The simple layout: project row of fixed height, text not pre-wrapped.
    pub fn with_fixed_project_row(mut self) -> Self {
        self.project_rows = ProjectRowSizing::Fixed(self.row_height * 2.0);
        self
    }
}
