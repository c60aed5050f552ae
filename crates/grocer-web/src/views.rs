//! HTML views: landing, main, upload form and error pages

use chrono::{DateTime, Local};

/// HTML-escape a string
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
body {{ font-family: -apple-system, 'PingFang SC', 'Microsoft YaHei', sans-serif; margin: 0; background: #fafafa; color: #333; }}
.container {{ max-width: 720px; margin: 0 auto; padding: 32px 16px; }}
h1 {{ font-size: 24px; }}
form {{ display: flex; flex-direction: column; gap: 12px; max-width: 320px; }}
input {{ padding: 8px; border: 1px solid #ccc; border-radius: 4px; }}
button {{ padding: 8px; background: #2d8cf0; color: #fff; border: none; border-radius: 4px; cursor: pointer; }}
pre {{ background: #f0f0f0; padding: 12px; overflow-x: auto; }}
.muted {{ color: #888; font-size: 13px; }}
</style>
</head>
<body>
<div class="container">
{body}
</div>
</body>
</html>"#,
        title = html_escape(title),
        body = body,
    )
}

fn format_time(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Landing page with the login form
pub fn index_page(app_name: &str, now: DateTime<Local>) -> String {
    let body = format!(
        r#"<h1>{name}</h1>
<p class="muted">{time}</p>
<form id="login" method="post" action="/login">
<input name="username" placeholder="用户名" autocomplete="username">
<input name="password" type="password" placeholder="密码" autocomplete="current-password">
<button type="submit">登录</button>
</form>"#,
        name = html_escape(app_name),
        time = format_time(now),
    );
    layout(app_name, &body)
}

/// Landing page for signed-in users
pub fn main_page(app_name: &str, now: DateTime<Local>, username: &str) -> String {
    let body = format!(
        r#"<h1>{name}</h1>
<p>欢迎, {user}</p>
<p class="muted">{time}</p>
<p><a href="/uploadPic">上传图片</a></p>
<form method="post" action="/logout"><button type="submit">退出</button></form>"#,
        name = html_escape(app_name),
        user = html_escape(username),
        time = format_time(now),
    );
    layout(app_name, &body)
}

/// Upload form
pub fn upload_page(title: &str) -> String {
    let body = format!(
        r#"<h1>{title}</h1>
<form method="post" action="/uploadPicInterface" enctype="multipart/form-data">
<input type="file" name="file" accept="image/*">
<button type="submit">上传</button>
</form>"#,
        title = html_escape(title),
    );
    layout(title, &body)
}

/// Error page; `detail` is only passed in development mode
pub fn error_page(message: &str, detail: Option<&str>) -> String {
    let mut body = format!("<h1>{}</h1>", html_escape(message));
    if let Some(detail) = detail {
        body.push_str(&format!("<pre>{}</pre>", html_escape(detail)));
    }
    layout(message, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(html_escape("<a href='x'>&</a>"), "&lt;a href=&#39;x&#39;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn test_error_page_detail() {
        let terse = error_page("Not Found", None);
        assert!(terse.contains("<h1>Not Found</h1>"));
        assert!(!terse.contains("<pre>"));

        let verbose = error_page("boom", Some("Internal(\"<stack>\")"));
        assert!(verbose.contains("<pre>Internal(&quot;&lt;stack&gt;&quot;)</pre>"));
    }

    #[test]
    fn test_main_page_escapes_username() {
        let html = main_page("shop", Local::now(), "<script>");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
