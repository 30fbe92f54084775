use url::Url;

/// Host fragments of well-known providers, checked in order
const KNOWN_PROVIDERS: &[(&str, &str)] = &[
    ("googleapis", "Google"),
    ("deepl", "DeepL"),
    ("microsoft", "Microsoft"),
    ("amazonaws", "AWS"),
    ("azure", "Azure"),
    ("github", "GitHub"),
    ("slack", "Slack"),
];

/// Provider name for a URL whose provider the caller did not name.
///
/// Known hosts map to their provider; any other host yields its first label
/// longer than three characters. Unparseable URLs and hosts without such a
/// label yield `Unknown`.
pub fn provider_from_url(url: &str) -> String {
    let Some(host) = Url::parse(url).ok().and_then(|url| url.host_str().map(str::to_ascii_lowercase)) else {
        return "Unknown".to_string();
    };

    if let Some((_, provider)) = KNOWN_PROVIDERS.iter().find(|(fragment, _)| host.contains(fragment)) {
        return provider.to_string();
    }

    host.split('.')
        .find(|label| label.len() > 3)
        .map(str::to_string)
        .unwrap_or_else(|| "Unknown".to_string())
}
