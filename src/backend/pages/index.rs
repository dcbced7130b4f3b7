/**
 * Index Page
 *
 * Site root. When a Facebook app is configured the page loads the Facebook
 * JS SDK and posts the resulting signed request to `/api/auth/facebook`.
 */

use axum::{extract::State, response::Html};

use crate::backend::i18n::{Locale, Message, RequestLocale};
use crate::backend::pages::templates::{escape_html, layout, script_json};
use crate::backend::server::state::AppState;
use crate::shared::Settings;

/// GET /
pub async fn index(State(state): State<AppState>, RequestLocale(locale): RequestLocale) -> Html<String> {
    Html(render_index(&state.settings, locale))
}

pub fn render_index(settings: &Settings, locale: Locale) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape_html(&settings.site_name));

    if let Some(app_id) = settings.facebook_app_id.as_deref() {
        body.push_str(&format!(
            r#"<button id="fb-login" type="button">{button}</button>
<pre id="fb-result"></pre>
<script>
window.fbAsyncInit = function () {{
  FB.init({{ appId: {app_id}, cookie: false, xfbml: false, version: "v19.0" }});
}};
document.getElementById("fb-login").addEventListener("click", function () {{
  FB.login(function (response) {{
    if (!response.authResponse) {{ return; }}
    fetch("/api/auth/facebook", {{
      method: "POST",
      headers: {{ "Content-Type": "application/json" }},
      body: JSON.stringify({{ signed_request: response.authResponse.signedRequest }})
    }})
      .then(function (res) {{ return res.json(); }})
      .then(function (data) {{
        document.getElementById("fb-result").textContent = JSON.stringify(data, null, 2);
      }});
  }}, {{ scope: "email" }});
}});
</script>
<script async defer crossorigin="anonymous" src="https://connect.facebook.net/{sdk_locale}/sdk.js"></script>
"#,
            button = escape_html(&locale.tr(Message::FacebookLoginButton)),
            app_id = script_json(app_id),
            sdk_locale = sdk_locale(locale),
        ));
    }

    layout(locale, &settings.site_name, &settings.site_name, &body)
}

fn sdk_locale(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "en_US",
        Locale::Fr => "fr_FR",
    }
}
