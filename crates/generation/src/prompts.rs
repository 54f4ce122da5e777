/// Prompt templates for wishes, stylised images and animated clips
use rand::seq::SliceRandom;

pub const IMAGE_PRESETS: [&str; 5] = [
    "A dreamy, watercolor-style re-imagining of this memory.",
    "Turn this moment into a magical, glowing fantasy scene.",
    "Recreate this photo in a beautiful, artistic painting style.",
    "A futuristic, cyberpunk version of this memory.",
    "An abstract artwork inspired by the emotions of this photo.",
];

pub const VIDEO_PRESETS: [&str; 5] = [
    "Make this photo come alive with a gentle zoom and soft, floating particles.",
    "Animate this image with a subtle heartbeat pulse effect.",
    "Create a cinematic reveal of this memory.",
    "Add a touch of magic with sparkling light effects.",
    "A funny, short animation based on this image.",
];

const VIDEO_SUFFIX: &str =
    "Make it a cinematic, high quality, emotional and heartwarming 5 second video.";

/// Hinglish instruction for a Raksha Bandhan message about one photo
pub fn wish_prompt(description: &str) -> String {
    format!(
        "Aap ek AI assistant hain jo Raksha Bandhan ke liye dil se nikle sandesh aur quotes likhte hain. \
Aapko Hinglish (Hindi written in English letters) mein jawab dena hai. \
Di gayi image ke vivaran ke aadhar par, ek mazedaar, bhavnaatmak ya dil ko chu lene wala Raksha Bandhan ka sandesh ya quote banayein.\n\n\
Image ka Vivaran: {}",
        description.trim()
    )
}

pub fn image_prompt(preset: &str, description: &str) -> String {
    format!("{} The original memory is: {}", preset.trim(), description.trim())
}

/// Final instruction sent to the image model.
///
/// With a reference photo the people in it must stay recognisable.
pub fn image_model_prompt(prompt: &str, with_reference: bool) -> String {
    if with_reference {
        format!(
            "Using the attached photo as reference and keeping every person in it recognisable, \
create a beautiful, artistic, and magical digital painting based on the following description: {}. \
Style: ethereal, dreamy, with soft lighting.",
            prompt.trim()
        )
    } else {
        format!(
            "A charming, colourful cartoon-style illustration based on the following description: {}. \
Style: warm, playful, festive.",
            prompt.trim()
        )
    }
}

pub fn video_prompt(preset: &str, description: &str) -> String {
    format!(
        "{} based on the description: {}. {}",
        preset.trim(),
        description.trim(),
        VIDEO_SUFFIX
    )
}

pub fn random_image_preset() -> &'static str {
    IMAGE_PRESETS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(IMAGE_PRESETS[0])
}

pub fn random_video_preset() -> &'static str {
    VIDEO_PRESETS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(VIDEO_PRESETS[0])
}
