//! Summary and photo page layout
//!
//! All geometry in PDF points, origin bottom-left. The planner is pure: it
//! turns text and photo pixel sizes into positioned draw operations, the PDF
//! writer only renders them.

use crate::i18n::Labels;

// ============================================
// Page geometry (A4 portrait)
// ============================================

pub const PAGE_WIDTH_PT: f32 = 595.28;
pub const PAGE_HEIGHT_PT: f32 = 841.89;
pub const MARGIN_PT: f32 = 50.0;
pub const TOP_Y_PT: f32 = PAGE_HEIGHT_PT - MARGIN_PT;

/// Widest an image may be drawn (page width minus both margins)
pub const MAX_IMAGE_WIDTH_PT: f32 = PAGE_WIDTH_PT - MARGIN_PT * 2.0;

// ============================================
// Text
// ============================================

pub const TITLE_FONT_SIZE: f32 = 18.0;
pub const TITLE_ADVANCE_PT: f32 = 30.0;
pub const LABEL_FONT_SIZE: f32 = 11.0;
pub const LINE_HEIGHT_PT: f32 = 18.0;
pub const NOTES_FONT_SIZE: f32 = 10.0;
pub const NOTES_LINE_HEIGHT_PT: f32 = 14.0;
/// Character-count wrap width for notes, not measured glyph widths
pub const NOTES_WRAP_CHARS: usize = 85;

// ============================================
// Photos
// ============================================

/// Below this the first photo moves to its own page
pub const MIN_IMAGE_HEIGHT_PT: f32 = 150.0;
pub const PHOTOS_PER_PAGE: usize = 2;
pub const PHOTO_GAP_PT: f32 = 20.0;
pub const CAPTION_FONT_SIZE: f32 = 10.0;
/// Caption baseline distance below the image
pub const CAPTION_OFFSET_PT: f32 = 14.0;
/// Vertical space reserved for a caption
pub const CAPTION_BLOCK_PT: f32 = 24.0;
/// Images taller than this many widths are turned to landscape
pub const TALL_IMAGE_RATIO: f32 = 1.3;

/// Height of one slot on a photo page, sized so two slots fill the page
pub const PHOTO_SLOT_HEIGHT_PT: f32 =
    (PAGE_HEIGHT_PT - MARGIN_PT * 2.0 - PHOTO_GAP_PT - CAPTION_BLOCK_PT * 2.0) / 2.0;

// ============================================
// Planner input / output
// ============================================

/// Text part of the summary page
#[derive(Debug, Clone, Default)]
pub struct SummaryContent {
    pub title: String,
    /// (label, value) pairs in display order
    pub lines: Vec<(String, String)>,
    pub notes_header: String,
    pub notes: String,
}

/// A decoded photo's pixel size. `number` is the caption number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoSize {
    pub number: usize,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        /// Baseline
        y: f32,
        size: f32,
        text: String,
    },
    Image {
        number: usize,
        x: f32,
        /// Bottom edge
        y: f32,
        width: f32,
        height: f32,
        /// Pixels must be turned 90° before drawing
        rotated: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannedPage {
    pub ops: Vec<DrawOp>,
}

impl PlannedPage {
    pub fn image_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Pages to append after the form page. The first page is the summary page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryPlan {
    pub pages: Vec<PlannedPage>,
}

impl SummaryPlan {
    pub fn image_count(&self) -> usize {
        self.pages.iter().map(PlannedPage::image_count).sum()
    }
}

/// Size an image takes on the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedImage {
    pub width: f32,
    pub height: f32,
    pub rotated: bool,
}

/// Fits a photo into `max_width` × `max_height`.
///
/// Very tall photos (height > 1.3 × width) are turned to landscape first.
/// Aspect ratio is kept and nothing is scaled above 1 px = 1 pt.
pub fn fit_image(width_px: u32, height_px: u32, max_width: f32, max_height: f32) -> FittedImage {
    let (mut w, mut h) = (width_px.max(1) as f32, height_px.max(1) as f32);
    let rotated = h > w * TALL_IMAGE_RATIO;
    if rotated {
        std::mem::swap(&mut w, &mut h);
    }

    let scale = (max_width / w).min(max_height / h).min(1.0).max(0.0);
    FittedImage {
        width: w * scale,
        height: h * scale,
        rotated,
    }
}

/// Greedy word wrap by character count. Explicit newlines start a new line.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            // words longer than a whole line are cut
            while word.len() > max_chars {
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            if line_len == 0 {
                line.extend(word.iter());
                line_len = word.len();
            } else if line_len + 1 + word.len() <= max_chars {
                line.push(' ');
                line.extend(word.iter());
                line_len += 1 + word.len();
            } else {
                lines.push(std::mem::take(&mut line));
                line.extend(word.iter());
                line_len = word.len();
            }
        }

        if line_len > 0 {
            lines.push(line);
        }
    }

    lines
}

/// Cursor over the pages being planned
struct SummaryPlanner {
    pages: Vec<PlannedPage>,
    y: f32,
    /// Photos on the current photo page; `None` until a photo page exists
    photos_on_page: Option<usize>,
}

impl SummaryPlanner {
    fn new() -> Self {
        Self {
            pages: vec![PlannedPage::default()],
            y: TOP_Y_PT,
            photos_on_page: None,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(PlannedPage::default());
        self.y = TOP_Y_PT;
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn text(&mut self, text: String, size: f32, advance: f32) {
        if self.y < MARGIN_PT {
            self.new_page();
        }
        self.push(DrawOp::Text {
            x: MARGIN_PT,
            y: self.y,
            size,
            text,
        });
        self.y -= advance;
    }

    fn image(&mut self, photo: &PhotoSize, fitted: FittedImage, labels: &Labels) {
        let top = self.y;
        let bottom = top - fitted.height;
        self.push(DrawOp::Image {
            number: photo.number,
            x: MARGIN_PT,
            y: bottom,
            width: fitted.width,
            height: fitted.height,
            rotated: fitted.rotated,
        });
        self.push(DrawOp::Text {
            x: MARGIN_PT,
            y: bottom - CAPTION_OFFSET_PT,
            size: CAPTION_FONT_SIZE,
            text: labels.photo_caption(photo.number),
        });
        self.y = bottom - CAPTION_BLOCK_PT - PHOTO_GAP_PT;
    }

    /// First photo goes under the text block if there is room for it
    fn first_photo_inline(&mut self, photo: &PhotoSize, labels: &Labels) -> bool {
        // baseline of the last text line sits one line above the cursor
        self.y -= PHOTO_GAP_PT - LINE_HEIGHT_PT + LABEL_FONT_SIZE;
        let available = self.y - MARGIN_PT - CAPTION_BLOCK_PT;
        if available <= MIN_IMAGE_HEIGHT_PT {
            return false;
        }
        let fitted = fit_image(photo.width_px, photo.height_px, MAX_IMAGE_WIDTH_PT, available);
        self.image(photo, fitted, labels);
        true
    }

    fn paged_photo(&mut self, photo: &PhotoSize, labels: &Labels) {
        match self.photos_on_page {
            Some(count) if count < PHOTOS_PER_PAGE => {}
            _ => {
                self.new_page();
                self.photos_on_page = Some(0);
            }
        }
        let fitted = fit_image(
            photo.width_px,
            photo.height_px,
            MAX_IMAGE_WIDTH_PT,
            PHOTO_SLOT_HEIGHT_PT,
        );
        self.image(photo, fitted, labels);
        self.photos_on_page = self.photos_on_page.map(|count| count + 1);
    }
}

/// Plans the summary page and any photo pages.
pub fn plan_summary(content: &SummaryContent, photos: &[PhotoSize], labels: &Labels) -> SummaryPlan {
    let mut planner = SummaryPlanner::new();

    planner.text(content.title.clone(), TITLE_FONT_SIZE, TITLE_ADVANCE_PT);
    for (label, value) in &content.lines {
        planner.text(format!("{}: {}", label, value), LABEL_FONT_SIZE, LINE_HEIGHT_PT);
    }

    if !content.notes.trim().is_empty() {
        planner.text(content.notes_header.clone(), LABEL_FONT_SIZE, LINE_HEIGHT_PT);
        for line in wrap_text(&content.notes, NOTES_WRAP_CHARS) {
            planner.text(line, NOTES_FONT_SIZE, NOTES_LINE_HEIGHT_PT);
        }
    }

    let mut remaining = photos.iter();
    if let Some(first) = remaining.next() {
        if !planner.first_photo_inline(first, labels) {
            planner.paged_photo(first, labels);
        }
    }
    for photo in remaining {
        planner.paged_photo(photo, labels);
    }

    SummaryPlan {
        pages: planner.pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Lang;

    fn content(notes: &str) -> SummaryContent {
        SummaryContent {
            title: "Find – summary".into(),
            lines: (0..11).map(|i| (format!("Label {}", i), "value".to_string())).collect(),
            notes_header: "Notes:".into(),
            notes: notes.into(),
        }
    }

    fn photos(n: usize, width_px: u32, height_px: u32) -> Vec<PhotoSize> {
        (1..=n)
            .map(|number| PhotoSize { number, width_px, height_px })
            .collect()
    }

    fn captions(page: &PlannedPage) -> Vec<String> {
        page.texts()
            .filter(|t| t.starts_with("Photo "))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_dimensions() {
        assert!((MAX_IMAGE_WIDTH_PT - 495.28).abs() < 0.01);
        assert!((TOP_Y_PT - 791.89).abs() < 0.01);
        // two slots plus captions and gap fill the page between the margins
        let used = PHOTO_SLOT_HEIGHT_PT * 2.0 + CAPTION_BLOCK_PT * 2.0 + PHOTO_GAP_PT;
        assert!((used - (PAGE_HEIGHT_PT - MARGIN_PT * 2.0)).abs() < 0.01);
    }

    #[test]
    fn test_fit_landscape_to_width() {
        let fitted = fit_image(4000, 3000, MAX_IMAGE_WIDTH_PT, 1000.0);
        assert!(!fitted.rotated);
        assert!((fitted.width - MAX_IMAGE_WIDTH_PT).abs() < 0.01);
        assert!((fitted.height - MAX_IMAGE_WIDTH_PT * 0.75).abs() < 0.01);
    }

    #[test]
    fn test_fit_limited_by_height() {
        let fitted = fit_image(1000, 1000, 495.0, 200.0);
        assert!((fitted.height - 200.0).abs() < 0.01);
        assert!((fitted.width - 200.0).abs() < 0.01);
    }

    #[test]
    fn test_fit_never_upscales() {
        let fitted = fit_image(120, 80, MAX_IMAGE_WIDTH_PT, 500.0);
        assert_eq!(fitted.width, 120.0);
        assert_eq!(fitted.height, 80.0);
    }

    #[test]
    fn test_tall_images_are_rotated() {
        let fitted = fit_image(3000, 4000, MAX_IMAGE_WIDTH_PT, 1000.0);
        assert!(fitted.rotated);
        assert!(fitted.width > fitted.height);

        // 1.3 exactly is not "very tall"
        let fitted = fit_image(1000, 1300, MAX_IMAGE_WIDTH_PT, 2000.0);
        assert!(!fitted.rotated);
    }

    #[test]
    fn test_wrap_text_greedy() {
        let lines = wrap_text("aaa bbb ccc ddd", 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn test_wrap_text_long_word_and_newlines() {
        let lines = wrap_text("abcdefghij\nxy z", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij", "xy z"]);
    }

    #[test]
    fn test_wrap_counts_characters_not_bytes() {
        let lines = wrap_text("øøø ååå", 7);
        assert_eq!(lines, vec!["øøø ååå"]);
    }

    #[test]
    fn test_no_photos_single_page() {
        let plan = plan_summary(&content(""), &[], Lang::En.labels());
        assert_eq!(plan.pages.len(), 1);
        assert_eq!(plan.image_count(), 0);
        // title + 11 lines, no notes header
        assert_eq!(plan.pages[0].texts().count(), 12);
    }

    #[test]
    fn test_notes_are_wrapped() {
        let notes = "ord ".repeat(60);
        let plan = plan_summary(&content(&notes), &[], Lang::En.labels());
        let texts: Vec<&str> = plan.pages[0].texts().collect();
        assert!(texts.contains(&"Notes:"));
        // 60 three-letter words fit 21 to a line at 85 chars
        assert_eq!(texts.len(), 12 + 1 + 3);
        assert!(texts.iter().all(|t| t.chars().count() <= NOTES_WRAP_CHARS));
    }

    #[test]
    fn test_first_photo_on_summary_page() {
        let plan = plan_summary(&content(""), &photos(1, 800, 600), Lang::En.labels());
        assert_eq!(plan.pages.len(), 1);
        assert_eq!(plan.pages[0].image_count(), 1);
        assert_eq!(captions(&plan.pages[0]), vec!["Photo 1"]);
    }

    #[test]
    fn test_five_photos_pagination() {
        let plan = plan_summary(&content(""), &photos(5, 4000, 3000), Lang::En.labels());
        assert_eq!(plan.pages.len(), 3);
        assert_eq!(plan.pages[0].image_count(), 1);
        assert_eq!(captions(&plan.pages[1]), vec!["Photo 2", "Photo 3"]);
        assert_eq!(captions(&plan.pages[2]), vec!["Photo 4", "Photo 5"]);
    }

    #[test]
    fn test_first_photo_moves_when_no_room() {
        // enough notes to leave less than the minimum image height
        let notes = "x".repeat(NOTES_WRAP_CHARS * 36);
        let plan = plan_summary(&content(&notes), &photos(3, 4000, 3000), Lang::En.labels());
        assert_eq!(plan.pages[0].image_count(), 0);
        assert_eq!(plan.pages.len(), 3);
        assert_eq!(captions(&plan.pages[1]), vec!["Photo 1", "Photo 2"]);
        assert_eq!(captions(&plan.pages[2]), vec!["Photo 3"]);
    }

    #[test]
    fn test_photos_stay_inside_margins() {
        let plan = plan_summary(&content(""), &photos(6, 3000, 4500), Lang::En.labels());
        for page in &plan.pages {
            for op in &page.ops {
                if let DrawOp::Image { x, y, width, height, .. } = op {
                    assert!(*y >= MARGIN_PT - 0.01, "image below margin: {}", y);
                    assert!(y + height <= TOP_Y_PT + 0.01);
                    assert!(x + width <= PAGE_WIDTH_PT - MARGIN_PT + 0.01);
                }
            }
        }
    }

    #[test]
    fn test_caption_numbers_follow_input() {
        let sizes = vec![
            PhotoSize { number: 1, width_px: 800, height_px: 600 },
            PhotoSize { number: 3, width_px: 800, height_px: 600 },
        ];
        let plan = plan_summary(&content(""), &sizes, Lang::No.labels());
        let all: Vec<&str> = plan.pages.iter().flat_map(|p| p.texts()).collect();
        assert!(all.contains(&"Foto 1"));
        assert!(all.contains(&"Foto 3"));
        assert!(!all.contains(&"Foto 2"));
    }
}
