//! Home page rendering.

const HOME_TEMPLATE: &str = include_str!("../assets/home.html");
const ENDPOINT_PLACEHOLDER: &str = "{{endpoint}}";

/// Render the chat page with `endpoint` as the socket URL.
///
/// The URL lands inside a `<script>` block as a JSON string literal.
pub fn render_home(endpoint: &str) -> String {
    let literal = serde_json::to_string(endpoint)
        .unwrap_or_else(|_| "\"\"".into())
        .replace('<', "\\u003c");
    HOME_TEMPLATE.replace(ENDPOINT_PLACEHOLDER, &literal)
}
