//! Human-paced timing for relays.
//!
//! A relay is paced as a declarative list of [`Phase`]s (look at the page, fill
//! each field, attach the file, read the disclosures, review, hesitate) and each
//! phase is sampled into a concrete delay. Sampling only touches the injected
//! random source, so a seeded source reproduces the same [`Plan`].

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;

use crate::models::SubmissionRecord;

use super::RelayMode;

/// Characters beyond this are treated as pasted rather than typed.
pub const MAX_TYPED_CHARS: usize = 400;

const CORRECTION_PROBABILITY: f64 = 0.04;
const WORD_PAUSE_PROBABILITY: f64 = 0.35;

const ORIENTATION: Bounds = Bounds::ms(2_000, 5_000);
const FILE_ATTACHMENT: Bounds = Bounds::ms(3_000, 8_000);
const DISCLOSURE_READING: Bounds = Bounds::ms(2_500, 6_000);
const FINAL_REVIEW: Bounds = Bounds::ms(3_000, 7_000);
const PRE_SUBMIT_HESITATION: Bounds = Bounds::ms(500, 2_000);
const CORRECTION_PAUSE: Bounds = Bounds::ms(300, 900);
const WORD_PAUSE: Bounds = Bounds::ms(150, 500);

/// Inclusive millisecond range for a uniformly drawn delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Bounds {
    pub const fn ms(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        rng.random_range(self.min_ms..=self.max_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    ShortText,
    Email,
    Phone,
    Dropdown,
    LongText,
}

impl FieldKind {
    /// Kind of each applicant field as rendered on the partner form.
    pub fn for_field(name: &str) -> Self {
        match name {
            "email" => FieldKind::Email,
            "phone" => FieldKind::Phone,
            "country" | "position" => FieldKind::Dropdown,
            "additional_info" => FieldKind::LongText,
            _ => FieldKind::ShortText,
        }
    }

    /// Moving to the field and settling in (or opening and picking a dropdown option).
    pub fn focus_bounds(&self) -> Bounds {
        match self {
            FieldKind::ShortText => Bounds::ms(300, 900),
            FieldKind::Email => Bounds::ms(400, 1_000),
            FieldKind::Phone => Bounds::ms(400, 1_100),
            FieldKind::Dropdown => Bounds::ms(800, 2_500),
            FieldKind::LongText => Bounds::ms(800, 2_000),
        }
    }

    /// Per-character delay; `None` for kinds that are not typed.
    pub fn keystroke_bounds(&self) -> Option<Bounds> {
        match self {
            FieldKind::ShortText => Some(Bounds::ms(80, 200)),
            FieldKind::Email => Some(Bounds::ms(90, 230)),
            FieldKind::Phone => Some(Bounds::ms(110, 260)),
            FieldKind::LongText => Some(Bounds::ms(60, 170)),
            FieldKind::Dropdown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    pub kind: FieldKind,
    pub text: String,
}

impl FieldShape {
    pub fn new(kind: FieldKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    fn typed_chars(&self) -> impl Iterator<Item = char> + '_ {
        self.text.chars().take(MAX_TYPED_CHARS)
    }
}

/// What the timing model needs to know about the form being filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormShape {
    pub fields: Vec<FieldShape>,
    pub has_file: bool,
    pub section_count: usize,
}

impl FormShape {
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Orientation,
    FieldFill { index: usize, kind: FieldKind },
    FileAttachment,
    DisclosureReading { section: usize },
    FinalReview,
    PreSubmitHesitation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDelay {
    pub phase: Phase,
    pub delay: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub steps: Vec<PlannedDelay>,
}

impl Plan {
    pub fn total(&self) -> Duration {
        self.steps.iter().map(|s| s.delay).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TimingModel {
    disclosure_sections: usize,
}

impl TimingModel {
    pub fn new(disclosure_sections: usize) -> Self {
        Self {
            disclosure_sections,
        }
    }

    pub fn shape_for(&self, record: &SubmissionRecord) -> FormShape {
        FormShape {
            fields: record
                .fields
                .pairs()
                .iter()
                .map(|(name, value)| FieldShape::new(FieldKind::for_field(name), *value))
                .collect(),
            has_file: record.resume_ref.is_some(),
            section_count: self.disclosure_sections,
        }
    }

    /// The ordered phase list for a humanized relay of `shape`.
    pub fn phases(shape: &FormShape) -> Vec<Phase> {
        let mut phases = Vec::with_capacity(shape.fields.len() + shape.section_count + 4);
        phases.push(Phase::Orientation);
        phases.extend(
            shape
                .fields
                .iter()
                .enumerate()
                .map(|(index, field)| Phase::FieldFill {
                    index,
                    kind: field.kind,
                }),
        );
        if shape.has_file {
            phases.push(Phase::FileAttachment);
        }
        phases.extend((0..shape.section_count).map(|section| Phase::DisclosureReading { section }));
        phases.push(Phase::FinalReview);
        phases.push(Phase::PreSubmitHesitation);
        phases
    }

    pub fn plan<R: Rng + ?Sized>(&self, shape: &FormShape, mode: RelayMode, rng: &mut R) -> Plan {
        if mode == RelayMode::Immediate {
            return Plan::default();
        }

        let steps = Self::phases(shape)
            .into_iter()
            .map(|phase| {
                let ms = match phase {
                    Phase::Orientation => ORIENTATION.sample(rng),
                    Phase::FieldFill { index, .. } => fill_ms(&shape.fields[index], rng),
                    Phase::FileAttachment => FILE_ATTACHMENT.sample(rng),
                    Phase::DisclosureReading { .. } => DISCLOSURE_READING.sample(rng),
                    Phase::FinalReview => FINAL_REVIEW.sample(rng),
                    Phase::PreSubmitHesitation => PRE_SUBMIT_HESITATION.sample(rng),
                };
                PlannedDelay {
                    phase,
                    delay: Duration::from_millis(ms),
                }
            })
            .collect();

        Plan { steps }
    }

    /// Smallest and largest total a humanized plan for `shape` can have.
    pub fn envelope(shape: &FormShape) -> RangeInclusive<Duration> {
        let (mut min, mut max) = (0u64, 0u64);
        for phase in Self::phases(shape) {
            let (lo, hi) = match phase {
                Phase::Orientation => (ORIENTATION.min_ms, ORIENTATION.max_ms),
                Phase::FieldFill { index, .. } => fill_envelope_ms(&shape.fields[index]),
                Phase::FileAttachment => (FILE_ATTACHMENT.min_ms, FILE_ATTACHMENT.max_ms),
                Phase::DisclosureReading { .. } => {
                    (DISCLOSURE_READING.min_ms, DISCLOSURE_READING.max_ms)
                }
                Phase::FinalReview => (FINAL_REVIEW.min_ms, FINAL_REVIEW.max_ms),
                Phase::PreSubmitHesitation => {
                    (PRE_SUBMIT_HESITATION.min_ms, PRE_SUBMIT_HESITATION.max_ms)
                }
            };
            min += lo;
            max += hi;
        }
        Duration::from_millis(min)..=Duration::from_millis(max)
    }
}

impl Default for TimingModel {
    fn default() -> Self {
        Self::new(1)
    }
}

fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | ',' | '@' | '-' | '_')
}

/// Focus delay plus the character-level typing model.
fn fill_ms<R: Rng + ?Sized>(field: &FieldShape, rng: &mut R) -> u64 {
    let mut total = field.kind.focus_bounds().sample(rng);
    let Some(keystroke) = field.kind.keystroke_bounds() else {
        return total;
    };

    for c in field.typed_chars() {
        total += keystroke.sample(rng);
        if rng.random_bool(CORRECTION_PROBABILITY) {
            total += CORRECTION_PAUSE.sample(rng);
        }
        if is_word_boundary(c) && rng.random_bool(WORD_PAUSE_PROBABILITY) {
            total += WORD_PAUSE.sample(rng);
        }
    }
    total
}

fn fill_envelope_ms(field: &FieldShape) -> (u64, u64) {
    let focus = field.kind.focus_bounds();
    let (mut min, mut max) = (focus.min_ms, focus.max_ms);
    if let Some(keystroke) = field.kind.keystroke_bounds() {
        for c in field.typed_chars() {
            min += keystroke.min_ms;
            max += keystroke.max_ms + CORRECTION_PAUSE.max_ms;
            if is_word_boundary(c) {
                max += WORD_PAUSE.max_ms;
            }
        }
    }
    (min, max)
}
