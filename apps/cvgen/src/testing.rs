//! Shared fixtures for unit tests: synthetic PDFs with a known fill, sample résumés,
//! and scripted fakes for the renderer and content-generator capabilities.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::EngineError;
use crate::generation::generator::{BulletContext, ContentGenerator, GenerationRequest};
use crate::layout::font_metrics::FontFamily;
use crate::models::cv::{ContactInfo, CvContent, EducationEntry, ExperienceEntry, Language};
use crate::models::metrics::PageFillMetrics;
use crate::render::pdf_writer::{text_operations, PdfBuilder};
use crate::render::{RenderError, Renderer};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const FIRST_BASELINE: f32 = 800.0;
const FONT_SIZE: f32 = 10.0;

/// A PDF of `pages` A4 pages whose text spans exactly `fill` percent of the page
/// height, measured the way the density meter measures it. `fill <= 0` yields
/// pages without any text.
pub fn synthetic_pdf(pages: u32, fill: f64) -> Vec<u8> {
    let mut builder = PdfBuilder::new(PAGE_WIDTH, PAGE_HEIGHT);
    for page in 0..pages.max(1) {
        if fill <= 0.0 {
            builder.add_page(Vec::new());
            continue;
        }
        let top = FIRST_BASELINE + 0.8 * FONT_SIZE;
        let extent = (fill as f32) * PAGE_HEIGHT / 100.0;
        let last_baseline = top - extent + 0.2 * FONT_SIZE;

        let mut ops = text_operations(
            FontFamily::Helvetica,
            FONT_SIZE,
            40.0,
            FIRST_BASELINE,
            &format!("Synthetic page {} header line", page + 1),
        );
        ops.extend(text_operations(
            FontFamily::Helvetica,
            FONT_SIZE,
            40.0,
            last_baseline,
            "Synthetic closing line",
        ));
        builder.add_page(ops);
    }
    builder.finish().unwrap()
}

pub fn metrics_with(pages: u32, fill: f64) -> PageFillMetrics {
    let single = pages <= 1;
    PageFillMetrics {
        page_count: pages,
        fill_percentage: fill,
        char_count: 3000,
        text_height: single.then(|| fill / 100.0 * PAGE_HEIGHT as f64),
        page_height: single.then_some(PAGE_HEIGHT as f64),
    }
}

fn sample_bullet(exp: usize, n: usize) -> String {
    format!(
        "Built a three-statement valuation model for deal {exp}-{n}, covering revenue bridges, \
         working capital and sensitivity tables reviewed weekly by the managing director"
    )
}

pub fn sample_experience(index: usize, bullets: usize) -> ExperienceEntry {
    ExperienceEntry {
        company: format!("Company {index}"),
        position: "Analyst".into(),
        date: Some("Jan 2022 - Jun 2022".into()),
        location: Some("Paris, France".into()),
        duration: Some("6 months".into()),
        bullets: (0..bullets).map(|n| sample_bullet(index, n)).collect(),
    }
}

/// A plausible résumé with `n_exp` experiences of `n_bullets` bullets each.
pub fn sample_cv(n_exp: usize, n_bullets: usize) -> CvContent {
    CvContent {
        contact: Some(ContactInfo {
            name: "Jane Doe".into(),
            email: "jane.doe@example.com".into(),
            phone: Some("+33 6 12 34 56 78".into()),
            address: Some("Paris, France".into()),
        }),
        education: vec![
            EducationEntry {
                institution: "HEC Paris".into(),
                degree: "MSc in International Finance".into(),
                date: Some("Sep 2021 - Jun 2023".into()),
                location: Some("Jouy-en-Josas, France".into()),
                coursework: vec![
                    "Corporate Finance".into(),
                    "Financial Modelling".into(),
                    "Private Equity".into(),
                    "Accounting".into(),
                ],
                ..Default::default()
            },
            EducationEntry {
                institution: "Lycée Louis-le-Grand".into(),
                degree: "Classe préparatoire ECS".into(),
                date: Some("Sep 2019 - Jun 2021".into()),
                location: Some("Paris, France".into()),
                coursework: vec!["Mathematics".into(), "Economics".into()],
                ..Default::default()
            },
        ],
        experience: (0..n_exp).map(|i| sample_experience(i + 1, n_bullets)).collect(),
        languages: vec!["French (native)".into(), "English (fluent)".into()],
        it_skills: vec!["Excel".into(), "PowerPoint".into(), "Python".into()],
        databases: vec!["Bloomberg".into(), "FactSet".into()],
        activities: vec!["Finance society treasurer, organising monthly speaker events".into()],
        certifications: vec![],
        summary: None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted renderer
// ────────────────────────────────────────────────────────────────────────────

/// Renderer that ignores content and returns synthetic PDFs with a scripted
/// `(pages, fill)` sequence. The last entry repeats once the script runs out.
pub struct ScriptedRenderer {
    script: Mutex<VecDeque<(u32, f64)>>,
    last: Mutex<(u32, f64)>,
    pub rendered: Mutex<Vec<(CvContent, bool)>>,
}

impl ScriptedRenderer {
    pub fn new(script: &[(u32, f64)]) -> Self {
        Self {
            script: Mutex::new(script.iter().copied().collect()),
            last: Mutex::new(script.last().copied().unwrap_or((1, 0.0))),
            rendered: Mutex::new(Vec::new()),
        }
    }

    pub fn render_count(&self) -> usize {
        self.rendered.lock().unwrap().len()
    }

    pub fn trim_flags(&self) -> Vec<bool> {
        self.rendered.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    pub fn last_content(&self) -> Option<CvContent> {
        self.rendered.lock().unwrap().last().map(|(c, _)| c.clone())
    }
}

impl Renderer for ScriptedRenderer {
    fn render(&self, content: &CvContent, trim_mode: bool) -> Result<Vec<u8>, RenderError> {
        self.rendered
            .lock()
            .unwrap()
            .push((content.clone(), trim_mode));
        let next = self.script.lock().unwrap().pop_front();
        let (pages, fill) = match next {
            Some(step) => {
                *self.last.lock().unwrap() = step;
                step
            }
            None => *self.last.lock().unwrap(),
        };
        Ok(synthetic_pdf(pages, fill))
    }

    fn to_docx(&self, _pdf_bytes: &[u8]) -> Result<Vec<u8>, RenderError> {
        Ok(b"docx".to_vec())
    }
}

/// A 23-word bullet, the length the bullet prompt asks for. It wraps onto two body
/// lines of the bundled template.
pub fn generated_bullet(call: usize, position: &str, company: &str) -> String {
    format!(
        "Generated bullet {call} for {position} at {company}, consolidating monthly reporting \
         for the finance team and reconciling ledger variances across three regional entities"
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Fake generator
// ────────────────────────────────────────────────────────────────────────────

/// Generator returning fixed content and counting every bullet request.
pub struct FakeGenerator {
    pub content: CvContent,
    pub recovered: Vec<ExperienceEntry>,
    /// Bullet calls whose zero-based index is listed here fail.
    pub failing_calls: Vec<usize>,
    /// Base generation fails when set.
    pub generate_error: Option<String>,
    pub bullet_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
    pub recovery_calls: AtomicUsize,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeGenerator {
    pub fn new(content: CvContent) -> Self {
        Self {
            content,
            recovered: Vec::new(),
            failing_calls: Vec::new(),
            generate_error: None,
            bullet_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
            recovery_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, calls: &[usize]) -> Self {
        self.failing_calls = calls.to_vec();
        self
    }

    pub fn failing_generate(mut self, message: &str) -> Self {
        self.generate_error = Some(message.to_string());
        self
    }

    pub fn with_recovered(mut self, entries: Vec<ExperienceEntry>) -> Self {
        self.recovered = entries;
        self
    }

    pub fn bullet_calls(&self) -> usize {
        self.bullet_calls.load(Ordering::SeqCst)
    }

    pub fn recovery_calls(&self) -> usize {
        self.recovery_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<CvContent, EngineError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        match &self.generate_error {
            Some(message) => Err(EngineError::GenerationFailure(message.clone())),
            None => Ok(self.content.clone()),
        }
    }

    async fn generate_bullet(&self, context: &BulletContext) -> Result<String, EngineError> {
        let call = self.bullet_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_calls.contains(&call) {
            return Err(EngineError::GenerationFailure("scripted failure".into()));
        }
        Ok(generated_bullet(call, &context.position, &context.company))
    }

    async fn recover_experiences(
        &self,
        _raw_text: &str,
        _language: Language,
    ) -> Result<Vec<ExperienceEntry>, EngineError> {
        self.recovery_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.recovered.clone())
    }
}
