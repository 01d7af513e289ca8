//! Pages module - generates the HTML pages served by the application.

/// Escape HTML special characters to prevent XSS attacks.
pub fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Data for the classification result page.
#[derive(Debug, Clone)]
pub struct ResultView {
    /// Display name of the predicted condition, or "Error"
    pub label: String,

    /// What happened after classification
    pub outcome: ResultOutcome,
}

/// Outcome half of [`ResultView`].
#[derive(Debug, Clone)]
pub enum ResultOutcome {
    /// Classification succeeded and a report was generated
    Classified {
        /// Confidence percentage in [0, 100]
        confidence: f64,
        /// URL of the stored image
        image_url: String,
        /// URL of the generated report
        report_url: String,
    },

    /// The model is unavailable; only an explanatory message is shown
    Unavailable {
        /// Why classification was not possible
        message: String,
    },
}

fn flash_block(flash: Option<&str>) -> String {
    match flash {
        Some(message) => format!(
            r#"<p class="flash">{}</p>"#,
            html_escape(message)
        ),
        None => String::new(),
    }
}

fn page_shell(title: &str, body: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - EyeIntel</title>
    <style>
        body {{ font-family: sans-serif; max-width: 640px; margin: 40px auto; padding: 0 16px; color: #222; }}
        h1 {{ font-size: 1.5em; }}
        .flash {{ background: #fff3cd; border: 1px solid #ffe08a; padding: 8px 12px; border-radius: 4px; }}
        form label {{ display: block; margin-top: 12px; }}
        input[type="text"], input[type="password"] {{ width: 100%; padding: 6px; }}
        button {{ margin-top: 16px; padding: 8px 20px; }}
        nav a {{ margin-right: 12px; }}
        img.fundus {{ max-width: 100%; border: 1px solid #ccc; margin-top: 12px; }}
        .error {{ color: #a40000; }}
    </style>
</head>
<body>
{body}
</body>
</html>"##,
        title = title,
        body = body
    )
}

/// Landing page.
pub fn landing_page(flash: Option<&str>) -> String {
    let body = format!(
        r#"<h1>EyeIntel</h1>
{flash}
<p>Upload an eye-fundus photograph and screen it for cataract, diabetic
retinopathy and glaucoma.</p>
<nav>
    <a href="/register">Register</a>
    <a href="/login">Log in</a>
    <a href="/detector">Detector</a>
</nav>"#,
        flash = flash_block(flash)
    );
    page_shell("Home", &body)
}

/// Registration form.
pub fn register_page(flash: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Register</h1>
{flash}
<form method="post" action="/register">
    <label>Username <input type="text" name="username" required></label>
    <label>Password <input type="password" name="password" required></label>
    <button type="submit">Register</button>
</form>
<p>Already registered? <a href="/login">Log in</a></p>"#,
        flash = flash_block(flash)
    );
    page_shell("Register", &body)
}

/// Login form.
pub fn login_page(flash: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Log in</h1>
{flash}
<form method="post" action="/login">
    <label>Username <input type="text" name="username" required></label>
    <label>Password <input type="password" name="password" required></label>
    <button type="submit">Log in</button>
</form>
<p>New here? <a href="/register">Register</a></p>"#,
        flash = flash_block(flash)
    );
    page_shell("Log in", &body)
}

/// Upload form for the detector.
pub fn detector_page(username: &str, flash: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Fundus Detector</h1>
{flash}
<p>Signed in as <strong>{username}</strong>. <a href="/logout">Log out</a></p>
<form method="post" action="/detector" enctype="multipart/form-data">
    <label>Fundus image (PNG or JPEG) <input type="file" name="file" accept=".png,.jpg,.jpeg"></label>
    <button type="submit">Analyze</button>
</form>"#,
        flash = flash_block(flash),
        username = html_escape(username)
    );
    page_shell("Detector", &body)
}

/// Classification result page.
pub fn result_page(view: &ResultView) -> String {
    let label = html_escape(&view.label);

    let body = match &view.outcome {
        ResultOutcome::Classified {
            confidence,
            image_url,
            report_url,
        } => format!(
            r#"<h1>Result</h1>
<p>Prediction: <strong>{label}</strong></p>
<p>Confidence: {confidence:.2}%</p>
<p><a href="{report_url}">Download PDF report</a></p>
<img class="fundus" src="{image_url}" alt="Uploaded fundus image">
<p><a href="/detector">Analyze another image</a></p>"#,
            label = label,
            confidence = confidence,
            image_url = html_escape(image_url),
            report_url = html_escape(report_url),
        ),
        ResultOutcome::Unavailable { message } => format!(
            r#"<h1>Result</h1>
<p>Prediction: <strong class="error">{label}</strong></p>
<p class="error">{message}</p>
<p><a href="/detector">Back to detector</a></p>"#,
            label = label,
            message = html_escape(message),
        ),
    };
    page_shell("Result", &body)
}

// =============================================================================
// Tests
// =============================================================================
