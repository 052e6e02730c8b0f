//! The instruction sent with every image.
//!
//! The section labels are shared with [`crate::interpret`]: the model is asked
//! to reproduce them verbatim, each followed by a colon, with a blank line
//! between sections. Nothing enforces that, so the interpreter treats every
//! section as optional.

pub const LIKELY_ORGANISM: &str = "Likely Organism";
pub const KEY_VISUAL_FEATURES: &str = "Key Visual Features";
pub const CONFIDENCE: &str = "Confidence";
pub const UNCERTAINTY_NOTES: &str = "Uncertainty Notes";

pub const ANALYSIS_PROMPT: &str = "\
You are a biomedical microscopy assistant.

Analyze the image and respond in EXACTLY this format:

Likely Organism:
<one short paragraph>

Key Visual Features:
- bullet point
- bullet point
- bullet point

Confidence:
<number between 0 and 100>%

Uncertainty Notes: (image quality, ambiguous features, etc.)
<one short sentence, or \"None\">
";
