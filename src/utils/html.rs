use ammonia;

/// Clean host-submitted listing descriptions using the ammonia library.
///
/// Whitelist-based sanitization: safe formatting tags survive, script
/// tags, iframes and event-handler attributes are stripped. Descriptions
/// are rendered on public detail pages, so this is the stored-XSS
/// fail-safe for everything hosts type into the dashboard.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
