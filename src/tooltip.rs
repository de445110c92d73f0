//! The single floating tooltip shared by every view

/// What a tooltip shows: a title line followed by detail lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TooltipContent {
    pub title: String,
    pub lines: Vec<String>,
}

impl TooltipContent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// Plain-text rendering, one line per row
    pub fn to_text(&self) -> String {
        std::iter::once(self.title.as_str())
            .chain(self.lines.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `1 neighbour`, `3 neighbours`
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Approximate tooltip box size used for edge avoidance
const TOOLTIP_WIDTH: f64 = 220.0;
const TOOLTIP_LINE_HEIGHT: f64 = 18.0;
const POINTER_OFFSET: f64 = 12.0;

/// Process-wide tooltip state. Exactly one exists and every view reuses it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tooltip {
    visible: bool,
    content: TooltipContent,
    x: f64,
    y: f64,
}

impl Tooltip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn content(&self) -> &TooltipContent {
        &self.content
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Show content next to the pointer, flipping to the left/top when it would
    /// overflow the viewport.
    pub fn show(&mut self, content: TooltipContent, pointer: (f64, f64), viewport: (f64, f64)) {
        let height = TOOLTIP_LINE_HEIGHT * (content.lines.len() + 1) as f64 + 16.0;
        let (px, py) = pointer;
        let (vw, vh) = viewport;

        let mut x = px + POINTER_OFFSET;
        if x + TOOLTIP_WIDTH > vw {
            x = px - POINTER_OFFSET - TOOLTIP_WIDTH;
        }
        let mut y = py + POINTER_OFFSET;
        if y + height > vh {
            y = py - POINTER_OFFSET - height;
        }

        self.x = x.max(0.0);
        self.y = y.max(0.0);
        self.content = content;
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}
