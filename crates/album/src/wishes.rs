use rand::seq::SliceRandom;

const DEFAULT_WISHES: &[&str] = &[
    "Tom & Jerry jaisi hai apni jodi, par Rakhi ke din no jhagda, only pyaar thodi thodi!",
    "Is Rakhi, bas ek promise: meri chocolate pe nazar mat dalna. Deal? Happy Raksha Bandhan!",
    "Duriyaan bhale hi ho, par apna connection bina lag wala wifi hai. Yaad aati hai!",
    "Gift? Vo sab chodo, bas ye yaad rakhna ki remote aaj mera hai. Happy Rakhi!",
    "Duniya ka sabse anmol bandhan. Tere jaisa bhai/behen kismat walon ko milta hai.",
    "Mere saare secrets ka vault hai tu. Is Rakhi, chalo aur yaadein banayein chhupane ke liye!",
];

/// Preset wishes used as placeholders when none was written or generated
pub fn default_wishes() -> &'static [&'static str] {
    DEFAULT_WISHES
}

pub fn random_default_wish() -> &'static str {
    DEFAULT_WISHES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Happy Raksha Bandhan!")
}
