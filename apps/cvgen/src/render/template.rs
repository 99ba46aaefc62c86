//! The fixed one-page CV template.
//!
//! Layout is a single column: centered header, then Education, Professional Experience
//! and Skills & Activities. Empty sections are skipped entirely so that sparse content
//! renders as a visibly sparse page. Lines are wrapped with the static Helvetica metric
//! tables and flow onto further pages when they do not fit; the density meter is what
//! decides whether that is acceptable.
//!
//! Trim mode only tightens vertical spacing between sections and entries. It never
//! drops content, so a trimmed render shows exactly the content it was given.

use lopdf::content::Operation;
use tracing::debug;

use crate::layout::font_metrics::{default_page_config, get_metrics, FontFamily, PageConfig};
use crate::models::cv::{ContactInfo, CvContent, EducationEntry, ExperienceEntry};
use crate::render::normalize::prepare;
use crate::render::pdf_writer::{rule_operations, text_operations, PdfBuilder};
use crate::render::{docx, RenderError, Renderer};

const BULLET_PREFIX: &str = "• ";
/// Section and entry gaps are scaled by this factor in trim mode.
const TRIM_MODE_GAP_SCALE: f32 = 0.5;

// ────────────────────────────────────────────────────────────────────────────
// Line model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Segment {
    font: FontFamily,
    /// Absolute x in points.
    x: f32,
    text: String,
}

#[derive(Debug, Clone)]
struct Line {
    size: f32,
    gap_before: f32,
    segments: Vec<Segment>,
    rule_below: bool,
}

impl Line {
    fn new(size: f32, gap_before: f32) -> Self {
        Self {
            size,
            gap_before,
            segments: Vec::new(),
            rule_below: false,
        }
    }

    fn push(mut self, font: FontFamily, x: f32, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.segments.push(Segment { font, x, text });
        }
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Renderer
// ────────────────────────────────────────────────────────────────────────────

/// Renders `CvContent` onto the A4 template with lopdf.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    config: PageConfig,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(default_page_config())
    }
}

impl TemplateRenderer {
    pub fn new(config: PageConfig) -> Self {
        Self { config }
    }

    /// The same template with trim-mode spacing.
    fn compacted(&self) -> Self {
        let mut config = self.config.clone();
        config.section_gap *= TRIM_MODE_GAP_SCALE;
        config.entry_gap *= TRIM_MODE_GAP_SCALE;
        Self { config }
    }

    fn left(&self) -> f32 {
        self.config.margin_left
    }

    fn right(&self) -> f32 {
        self.left() + self.config.text_width()
    }

    fn right_aligned_x(&self, font: FontFamily, size: f32, text: &str) -> f32 {
        self.right() - get_metrics(font).width_pt(text, size)
    }

    fn centered_x(&self, font: FontFamily, size: f32, text: &str) -> f32 {
        (self.config.page_width - get_metrics(font).width_pt(text, size)) / 2.0
    }

    /// Wraps `text` into body lines starting at `x`, with continuation lines at `indent_x`.
    fn wrapped(&self, font: FontFamily, text: &str, x: f32, indent_x: f32, gap: f32) -> Vec<Line> {
        let size = self.config.body_size;
        let metrics = get_metrics(font);
        let first_width = self.right() - x;
        let rest_width = self.right() - indent_x;

        let first_lines = metrics.wrap(text, size, first_width);
        let Some(first) = first_lines.first() else {
            return Vec::new();
        };
        let mut lines = vec![Line::new(size, gap).push(font, x, first.clone())];

        let consumed = first.split_whitespace().count();
        let remainder: Vec<&str> = text.split_whitespace().skip(consumed).collect();
        for chunk in metrics.wrap(&remainder.join(" "), size, rest_width) {
            lines.push(Line::new(size, 0.0).push(font, indent_x, chunk));
        }
        lines
    }

    fn heading(&self, title: &str) -> Line {
        let mut line = Line::new(self.config.heading_size, self.config.section_gap).push(
            FontFamily::HelveticaBold,
            self.left(),
            title,
        );
        line.rule_below = true;
        line
    }

    /// Left text plus an optional right-aligned tail on the same line.
    fn split_line(
        &self,
        font: FontFamily,
        left: &str,
        right: Option<&str>,
        gap: f32,
    ) -> Line {
        let size = self.config.body_size;
        let mut line = Line::new(size, gap).push(font, self.left(), left);
        if let Some(right) = right.filter(|r| !r.trim().is_empty()) {
            line = line.push(font, self.right_aligned_x(font, size, right), right);
        }
        line
    }

    fn header_lines(&self, contact: &ContactInfo, summary: Option<&str>) -> Vec<Line> {
        let mut lines = Vec::new();
        let cfg = &self.config;

        if !contact.name.trim().is_empty() {
            let name = contact.name.trim();
            lines.push(Line::new(cfg.name_size, 0.0).push(
                FontFamily::HelveticaBold,
                self.centered_x(FontFamily::HelveticaBold, cfg.name_size, name),
                name,
            ));
        }

        let details: Vec<&str> = [
            Some(contact.email.as_str()),
            contact.phone.as_deref(),
            contact.address.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
        if !details.is_empty() {
            let joined = details.join(" | ");
            lines.push(Line::new(cfg.body_size, 2.0).push(
                FontFamily::Helvetica,
                self.centered_x(FontFamily::Helvetica, cfg.body_size, &joined),
                joined,
            ));
        }

        if let Some(summary) = summary.filter(|s| !s.trim().is_empty()) {
            lines.extend(self.wrapped(
                FontFamily::Helvetica,
                summary,
                self.left(),
                self.left(),
                cfg.entry_gap,
            ));
        }
        lines
    }

    fn education_lines(&self, entry: &EducationEntry) -> Vec<Line> {
        let mut lines = vec![self.split_line(
            FontFamily::HelveticaBold,
            &entry.institution,
            entry.location.as_deref(),
            self.config.entry_gap,
        )];

        let degree = match entry.major.as_deref() {
            Some(major) if !major.trim().is_empty() => format!("{}, {}", entry.degree, major),
            _ => entry.degree.clone(),
        };
        lines.push(self.split_line(
            FontFamily::Helvetica,
            &degree,
            entry.date.as_deref(),
            0.0,
        ));

        if let Some(honors) = entry.honors.as_deref().filter(|h| !h.trim().is_empty()) {
            lines.extend(self.wrapped(
                FontFamily::Helvetica,
                honors,
                self.left(),
                self.left(),
                0.0,
            ));
        }
        if !entry.coursework.is_empty() {
            let text = format!("Coursework: {}", entry.coursework.join(", "));
            lines.extend(self.wrapped(
                FontFamily::Helvetica,
                &text,
                self.left(),
                self.left(),
                0.0,
            ));
        }
        lines
    }

    fn experience_lines(&self, entry: &ExperienceEntry) -> Vec<Line> {
        let mut lines = vec![self.split_line(
            FontFamily::HelveticaBold,
            &entry.company,
            entry.location.as_deref(),
            self.config.entry_gap,
        )];

        let date = match (entry.date.as_deref(), entry.duration.as_deref()) {
            (Some(d), Some(dur)) if !dur.trim().is_empty() => Some(format!("{d} ({dur})")),
            (Some(d), _) => Some(d.to_string()),
            (None, Some(dur)) => Some(dur.to_string()),
            (None, None) => None,
        };
        lines.push(self.split_line(
            FontFamily::Helvetica,
            &entry.position,
            date.as_deref(),
            0.0,
        ));

        let bullet_x = self.left() + 4.0;
        let indent_x = bullet_x + self.config.bullet_indent;
        for bullet in &entry.bullets {
            let text = format!("{BULLET_PREFIX}{}", bullet.trim());
            lines.extend(self.wrapped(FontFamily::Helvetica, &text, bullet_x, indent_x, 0.0));
        }
        lines
    }

    fn labelled_list(&self, label: &str, items: &[String]) -> Vec<Line> {
        if items.is_empty() {
            return Vec::new();
        }
        let size = self.config.body_size;
        let label = format!("{label}: ");
        let label_w = get_metrics(FontFamily::HelveticaBold).width_pt(&label, size);
        let mut lines = self.wrapped(
            FontFamily::Helvetica,
            &items.join(", "),
            self.left() + label_w,
            self.left(),
            1.0,
        );
        if let Some(first) = lines.first_mut() {
            first.segments.insert(
                0,
                Segment {
                    font: FontFamily::HelveticaBold,
                    x: self.left(),
                    text: label.trim_end().to_string(),
                },
            );
        }
        lines
    }

    fn layout(&self, content: &CvContent) -> Vec<Line> {
        let mut lines = Vec::new();

        if let Some(contact) = &content.contact {
            lines.extend(self.header_lines(contact, content.summary.as_deref()));
        }

        if !content.education.is_empty() {
            lines.push(self.heading("EDUCATION"));
            for entry in &content.education {
                lines.extend(self.education_lines(entry));
            }
        }

        if !content.experience.is_empty() {
            lines.push(self.heading("PROFESSIONAL EXPERIENCE"));
            for entry in &content.experience {
                lines.extend(self.experience_lines(entry));
            }
        }

        let mut skills = Vec::new();
        skills.extend(self.labelled_list("Languages", &content.languages));
        skills.extend(self.labelled_list("IT Skills", &content.it_skills));
        skills.extend(self.labelled_list("Databases", &content.databases));
        skills.extend(self.labelled_list("Certifications", &content.certifications));
        skills.extend(self.labelled_list("Activities", &content.activities));
        if !skills.is_empty() {
            lines.push(self.heading("SKILLS & ACTIVITIES"));
            lines.extend(skills);
        }

        lines.retain(|l| !l.segments.is_empty());
        lines
    }

    /// Flows lines onto as many pages as needed.
    fn paginate(&self, lines: Vec<Line>) -> PdfBuilder {
        let cfg = &self.config;
        let top = cfg.page_height - cfg.margin_top;
        let mut builder = PdfBuilder::new(cfg.page_width, cfg.page_height);
        let mut ops: Vec<Operation> = Vec::new();
        let mut cursor = top;
        let mut page_started = false;

        for line in lines {
            let height = cfg.line_height(line.size);
            let mut gap = if page_started { line.gap_before } else { 0.0 };
            if page_started && cursor - gap - height < cfg.margin_bottom {
                builder.add_page(std::mem::take(&mut ops));
                cursor = top;
                gap = 0.0;
            }
            page_started = true;
            let baseline = cursor - gap - line.size;
            for segment in &line.segments {
                ops.extend(text_operations(
                    segment.font,
                    line.size,
                    segment.x,
                    baseline,
                    &segment.text,
                ));
            }
            if line.rule_below {
                ops.extend(rule_operations(self.left(), self.right(), baseline - 2.5));
            }
            cursor -= gap + height;
        }

        builder.add_page(ops);
        builder
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, content: &CvContent, trim_mode: bool) -> Result<Vec<u8>, RenderError> {
        let compacted;
        let template = if trim_mode {
            compacted = self.compacted();
            &compacted
        } else {
            self
        };
        let lines = template.layout(&prepare(content));
        let line_count = lines.len();
        let builder = template.paginate(lines);
        debug!(
            "Rendered {} lines onto {} page(s) (trim_mode={})",
            line_count,
            builder.page_count(),
            trim_mode
        );
        builder.finish()
    }

    fn to_docx(&self, pdf_bytes: &[u8]) -> Result<Vec<u8>, RenderError> {
        docx::pdf_to_docx(pdf_bytes)
    }
}
