//! Instructions and schemas sent to the generation models.

use crate::song::{LatentParams, SongStructure};
use serde_json::{json, Value};

/// Image used when the image model returns no inline picture.
pub const PLACEHOLDER_ART_URL: &str = "https://picsum.photos/1024/1024?grayscale";

pub(crate) const ALBUM_ART_ASPECT_RATIO: &str = "1:1";

pub(crate) fn song_concept_prompt(prompt: &str, params: &LatentParams) -> String {
    format!(
        "Design a detailed song concept based on the prompt: \"{prompt}\".\n\
         Incorporate these latent diffusion parameters:\n\
         - Melodic Entropy (Unpredictability): {}%\n\
         - Harmonic Depth (Complexity): {}%\n\
         - Rhythmic Density (Activity): {}%\n\
         - Emotional Variance (Contrast): {}%\n\
         \n\
         The output must be JSON format.",
        params.melodic_entropy,
        params.harmonic_depth,
        params.rhythmic_density,
        params.emotional_variance,
    )
}

/// Response schema constraining the concept call to a `SongStructure`.
pub(crate) fn song_concept_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "genre": { "type": "STRING" },
            "tempo": { "type": "INTEGER" },
            "key": { "type": "STRING" },
            "mood": { "type": "STRING" },
            "lyrics": {
                "type": "OBJECT",
                "properties": {
                    "verse1": { "type": "STRING" },
                    "chorus": { "type": "STRING" },
                    "verse2": { "type": "STRING" },
                    "bridge": { "type": "STRING" },
                    "outro": { "type": "STRING" }
                },
                "required": ["verse1", "chorus", "verse2", "bridge", "outro"]
            },
            "instrumentation": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "compositionalAnalysis": {
                "type": "STRING",
                "description": "A technical breakdown of how the latent parameters influenced the composition."
            }
        },
        "required": [
            "title", "genre", "tempo", "key", "mood",
            "lyrics", "instrumentation", "compositionalAnalysis"
        ]
    })
}

pub(crate) fn album_art_prompt(prompt: &str, song: &SongStructure) -> String {
    format!(
        "Cinematic, hyper-detailed album cover for a song titled \"{}\".\n\
         Style: {}, {}. Visual elements: {}.\n\
         Concept: {}. Aesthetic: Ethereal, latent diffusion patterns, abstract sonic waves. High quality 4k.",
        song.title,
        song.genre,
        song.mood,
        song.instrumentation.join(", "),
        prompt,
    )
}

pub(crate) fn vocal_preview_prompt(text: &str) -> String {
    format!("Read these lyrics with the appropriate emotion: {}", text)
}
