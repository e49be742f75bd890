use super::types::Platform;

/// One row of the dispatch table. A rule matches when the URL contains any
/// of `any`, and, if `also` is set, additionally contains one of those.
struct Rule {
    platform: Platform,
    any: &'static [&'static str],
    also: Option<&'static [&'static str]>,
}

/// Ordered dispatch table. Order is load-bearing: the photo-post rule must
/// precede every host rule, and Twitch clips must be recognized before any
/// later catch-all could claim them. First match wins.
const RULES: &[Rule] = &[
    Rule {
        platform: Platform::TikTokPhoto,
        any: &["/photo/"],
        also: None,
    },
    Rule {
        platform: Platform::Twitter,
        any: &["twitter.com", "x.com"],
        also: None,
    },
    Rule {
        platform: Platform::Reddit,
        any: &["reddit.com", "redd.it"],
        also: None,
    },
    Rule {
        platform: Platform::Twitch,
        any: &["twitch.tv"],
        also: Some(&["/clip/", "clips.twitch.tv"]),
    },
    Rule {
        platform: Platform::SoundCloud,
        any: &["soundcloud.com"],
        also: None,
    },
    Rule {
        platform: Platform::YouTube,
        any: &["youtube.com", "youtu.be"],
        also: None,
    },
    Rule {
        platform: Platform::Instagram,
        any: &["instagram.com"],
        also: None,
    },
    Rule {
        platform: Platform::Medal,
        any: &["medal.tv"],
        also: None,
    },
    Rule {
        platform: Platform::Streamable,
        any: &["streamable.com"],
        also: None,
    },
    Rule {
        platform: Platform::Vimeo,
        any: &["vimeo.com"],
        also: None,
    },
    Rule {
        platform: Platform::Kick,
        any: &["kick.com"],
        also: None,
    },
    Rule {
        platform: Platform::Facebook,
        any: &["facebook.com", "fb.watch"],
        also: None,
    },
    Rule {
        platform: Platform::Snapchat,
        any: &["snapchat.com"],
        also: None,
    },
];

/// Maps a resolved URL to exactly one platform. Pure, deterministic, total:
/// every input yields a platform, with `Generic` as the unconditional final
/// branch, so a "nothing matched" error cannot occur.
pub fn classify(url: &str) -> Platform {
    for rule in RULES {
        let primary = rule.any.iter().any(|pattern| url.contains(pattern));
        if !primary {
            continue;
        }
        let secondary = rule
            .also
            .map(|patterns| patterns.iter().any(|pattern| url.contains(pattern)))
            .unwrap_or(true);
        if secondary {
            return rule.platform;
        }
    }

    Platform::Generic
}
