//! The single HTML page: shows the code while one is live, a placeholder otherwise.
//! The page reloads itself so a new or expired code shows up without user action.

const REFRESH_SECS: u32 = 5;

pub fn render_index(available: bool) -> String {
    let body = if available {
        r#"<img src="/artifact" alt="QR code" width="320" height="320">"#
    } else {
        r#"<p class="placeholder">No code to show right now.</p>"#
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="{refresh}">
<title>qrflash</title>
</head>
<body data-available="{available}">
<main>
{body}
</main>
</body>
</html>
"#,
        refresh = REFRESH_SECS,
        available = available,
        body = body,
    )
}
