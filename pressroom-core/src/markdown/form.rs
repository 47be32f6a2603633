//! Forms for ```` ```form ```` blocks.

use super::fenced::BlockTransformer;
use super::html_escape;
use serde_yaml::Value;
use thiserror::Error;

pub const SUBMIT_PATH: &str = "/api/v1/forms/submit";
pub const HONEYPOT_FIELD: &str = "website";

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Invalid form YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Form block must be a mapping")]
    NotAMapping,

    #[error("Form block has no type")]
    MissingType,

    #[error("Unsupported form type: {0}")]
    UnsupportedType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Contact,
}

impl FormKind {
    pub fn from_yaml(source: &str) -> Result<Self, FormError> {
        let value: Value = serde_yaml::from_str(source)?;
        let Value::Mapping(map) = value else {
            return Err(FormError::NotAMapping);
        };
        let kind = match map.get("type") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_ascii_lowercase(),
            _ => return Err(FormError::MissingType),
        };
        match kind.as_str() {
            "contact" => Ok(FormKind::Contact),
            _ => Err(FormError::UnsupportedType(kind)),
        }
    }
}

/// Submission URL for a configured endpoint
pub fn submit_action(endpoint: Option<&str>) -> String {
    match endpoint.map(|e| e.trim().trim_end_matches('/')) {
        Some(base) if !base.is_empty() => format!("{}{}", base, SUBMIT_PATH),
        _ => SUBMIT_PATH.to_string(),
    }
}

pub fn render(source: &str, site_slug: &str, endpoint: Option<&str>) -> Result<String, FormError> {
    match FormKind::from_yaml(source)? {
        FormKind::Contact => Ok(contact_form(site_slug, &submit_action(endpoint))),
    }
}

fn contact_form(site_slug: &str, action: &str) -> String {
    format!(
        r#"<form class="content-form contact-form" method="post" action="{action}" data-pressroom-form>
<input type="hidden" name="form_type" value="contact">
<input type="hidden" name="site" value="{site}">
<div class="form-field form-honeypot" style="display:none" aria-hidden="true"><label>Leave this empty <input type="text" name="{honeypot}" tabindex="-1" autocomplete="off"></label></div>
<div class="form-field"><label for="contact-name">Name</label><input type="text" id="contact-name" name="name" required></div>
<div class="form-field"><label for="contact-email">Email</label><input type="email" id="contact-email" name="email" required></div>
<div class="form-field"><label for="contact-message">Message</label><textarea id="contact-message" name="message" rows="6" required></textarea></div>
<button type="submit">Send</button>
<p class="form-status" role="status"></p>
</form>
{script}"#,
        action = html_escape(action),
        site = html_escape(site_slug),
        honeypot = HONEYPOT_FIELD,
        script = SUBMIT_SCRIPT,
    )
}

const SUBMIT_SCRIPT: &str = r#"<script>
document.querySelectorAll('form[data-pressroom-form]').forEach(function (form) {
  if (form.dataset.bound) { return; }
  form.dataset.bound = '1';
  form.addEventListener('submit', function (event) {
    event.preventDefault();
    var status = form.querySelector('.form-status');
    var payload = Object.fromEntries(new FormData(form).entries());
    fetch(form.action, {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(payload)
    }).then(function (res) {
      if (!res.ok) { throw new Error(res.statusText); }
      form.reset();
      status.textContent = 'Thanks, your message was sent.';
    }).catch(function () {
      status.textContent = 'Sorry, the message could not be sent.';
    });
  });
});
</script>"#;

/// Handles `form` blocks during document conversion
#[derive(Debug, Clone)]
pub struct FormTransformer {
    site_slug: String,
    endpoint: Option<String>,
}

impl FormTransformer {
    pub fn new(site_slug: &str, endpoint: Option<String>) -> Self {
        Self {
            site_slug: site_slug.to_string(),
            endpoint,
        }
    }
}

impl BlockTransformer for FormTransformer {
    fn language(&self) -> &str {
        "form"
    }

    fn transform(&self, source: &str) -> Option<String> {
        match render(source, &self.site_slug, self.endpoint.as_deref()) {
            Ok(html) => Some(html),
            Err(e) => {
                tracing::warn!(site = %self.site_slug, error = %e, "skipping form block");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_action() {
        assert_eq!(submit_action(None), "/api/v1/forms/submit");
        assert_eq!(submit_action(Some("  ")), "/api/v1/forms/submit");
        assert_eq!(
            submit_action(Some("https://forms.example.com/")),
            "https://forms.example.com/api/v1/forms/submit"
        );
    }

    #[test]
    fn test_contact_form_fields() {
        let html = render("type: contact", "my-site", Some("https://api.example.com")).unwrap();
        assert!(html.contains(r#"action="https://api.example.com/api/v1/forms/submit""#));
        assert!(html.contains(r#"name="site" value="my-site""#));
        assert!(html.contains(r#"name="website" tabindex="-1""#));
        assert!(html.contains("fetch(form.action"));
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(
            render("type: survey", "s", None),
            Err(FormError::UnsupportedType(t)) if t == "survey"
        ));
        assert!(matches!(render("title: x", "s", None), Err(FormError::MissingType)));
        assert!(matches!(render("just text", "s", None), Err(FormError::NotAMapping)));
        assert!(matches!(render("type: [", "s", None), Err(FormError::Yaml(_))));
    }

    #[test]
    fn test_transformer_leaves_unknown_types() {
        let t = FormTransformer::new("s", None);
        assert!(t.transform("type: newsletter").is_none());
        assert!(t.transform("type: Contact").is_some());
    }
}
