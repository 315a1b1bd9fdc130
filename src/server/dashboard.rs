use crate::webhook::{WebhookRecord, format_timestamp};

/// One webhook as shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookView {
    pub alert_name: String,
    pub alert_type: String,
    pub timestamp: String,
    pub formatted_data: String,
}

impl From<&WebhookRecord> for WebhookView {
    fn from(record: &WebhookRecord) -> Self {
        let alert = record.alert();
        Self {
            alert_name: alert.name,
            alert_type: alert.alert_type,
            timestamp: format_timestamp(&record.received_at),
            formatted_data: serde_json::to_string_pretty(&record.payload)
                .unwrap_or_else(|_| record.payload.to_string()),
        }
    }
}

/// Everything the dashboard page displays.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub webhook_url: String,
    pub webhook_count: usize,
    pub capacity: usize,
    pub last_webhook_time: String,
    /// Newest first.
    pub webhooks: Vec<WebhookView>,
}

impl DashboardView {
    /// Builds the view from a single newest-first snapshot, so the count,
    /// the last webhook time and the list always agree.
    pub fn new(webhook_url: &str, capacity: usize, snapshot: Vec<WebhookRecord>) -> Self {
        Self {
            webhook_url: webhook_url.to_string(),
            webhook_count: snapshot.len(),
            capacity,
            last_webhook_time: snapshot
                .first()
                .map(|record| format_timestamp(&record.received_at))
                .unwrap_or_else(|| "Never".to_string()),
            webhooks: snapshot.iter().map(WebhookView::from).collect(),
        }
    }
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Webhook Test Server</title>
    <style>
        body { font-family: 'Courier New', monospace; background: #c0c0c0; margin: 0; padding: 20px; color: #000; }
        .container { max-width: 1200px; margin: 0 auto; }
        .panel { background: #fff; border: 2px solid #000; padding: 15px; margin-bottom: 20px; box-shadow: 2px 2px 0 #000; }
        .header { background: #000080; color: #fff; padding: 15px; margin-bottom: 20px; border: 2px solid #000; box-shadow: 2px 2px 0 #000; }
        .panel h3 { margin-top: 0; color: #000080; }
        code { background: #f0f0f0; padding: 2px 4px; border-radius: 2px; }
        .webhook-list { background: #fff; border: 2px solid #000; box-shadow: 2px 2px 0 #000; }
        .webhook-list h3 { margin: 0; padding: 15px; border-bottom: 2px solid #000; }
        .webhook-item { border-bottom: 1px solid #ccc; padding: 15px; cursor: pointer; }
        .webhook-item:hover { background: #f0f0f0; }
        .webhook-item:last-child { border-bottom: none; }
        .webhook-header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 10px; }
        .webhook-timestamp { font-size: 12px; color: #666; }
        .webhook-type { background: #ff6b35; color: #fff; padding: 2px 8px; border-radius: 3px; font-size: 12px; font-weight: bold; }
        .webhook-content { background: #f8f8f8; border: 1px solid #ddd; padding: 10px; border-radius: 3px; font-size: 12px; white-space: pre-wrap; max-height: 200px; overflow-y: auto; display: none; }
        .webhook-content.expanded { display: block; }
        .clear-btn { background: #f00; color: #fff; border: 2px solid #000; padding: 8px 16px; cursor: pointer; font-weight: bold; box-shadow: 2px 2px 0 #000; }
        .clear-btn:hover { background: #c00; }
        .no-webhooks { text-align: center; padding: 40px; color: #666; font-style: italic; }
    </style>
</head>
"#;

/// Renders the dashboard as a standalone HTML page.
///
/// All values taken from webhooks are HTML-escaped. The page polls `/status`
/// every 5 seconds and reloads itself when the webhook count changes.
pub fn render_dashboard(view: &DashboardView) -> String {
    let url = escape_html(&view.webhook_url);
    let mut html = String::from(PAGE_HEAD);

    html.push_str(&format!(
        r#"<body>
<div class="container">
    <div class="header">
        <h1>Webhook Test Server</h1>
        <p>Inspect webhook notifications as they arrive</p>
    </div>
    <div class="panel">
        <h3>How to use:</h3>
        <ol>
            <li>Point your webhook sender at <code>{url}</code></li>
            <li>Trigger a notification in the sending system</li>
            <li>Received webhooks show up below, newest first</li>
            <li>Click on any webhook to expand and view the full data</li>
        </ol>
    </div>
    <div class="panel">
        <h3>Server Status</h3>
        <p><strong>Status:</strong> <span style="color: green;">Running</span></p>
        <p><strong>Webhook Endpoint:</strong> <code>{url}</code></p>
        <p><strong>Total Webhooks Received:</strong> {count}</p>
        <p><strong>Kept in Memory:</strong> last {capacity}</p>
        <p><strong>Last Webhook:</strong> {last}</p>
        <button class="clear-btn" onclick="clearWebhooks()">Clear All Webhooks</button>
    </div>
    <div class="webhook-list">
        <h3>Received Webhooks</h3>
"#,
        count = view.webhook_count,
        capacity = view.capacity,
        last = escape_html(&view.last_webhook_time),
    ));

    if view.webhooks.is_empty() {
        html.push_str(
            r#"        <div class="no-webhooks">
            <p>No webhooks received yet...</p>
            <p>Send a JSON POST request to the webhook endpoint to test!</p>
        </div>
"#,
        );
    }
    for (index, webhook) in view.webhooks.iter().enumerate() {
        let id = index + 1;
        html.push_str(&format!(
            r#"        <div class="webhook-item" onclick="toggleWebhook('webhook-{id}')">
            <div class="webhook-header">
                <div>
                    <strong>{name}</strong>
                    <span class="webhook-type">{alert_type}</span>
                </div>
                <div class="webhook-timestamp">{timestamp}</div>
            </div>
            <div class="webhook-content" id="webhook-{id}">{data}</div>
        </div>
"#,
            name = escape_html(&webhook.alert_name),
            alert_type = escape_html(&webhook.alert_type),
            timestamp = escape_html(&webhook.timestamp),
            data = escape_html(&webhook.formatted_data),
        ));
    }

    html.push_str(&format!(
        r#"    </div>
</div>
<script>
    function toggleWebhook(id) {{
        document.getElementById(id).classList.toggle('expanded');
    }}

    function clearWebhooks() {{
        if (confirm('Are you sure you want to clear all webhooks?')) {{
            fetch('/clear', {{ method: 'POST' }}).then(() => window.location.reload());
        }}
    }}

    setInterval(() => {{
        fetch('/status')
            .then(response => response.json())
            .then(data => {{
                if (data.webhook_count !== {count}) {{
                    window.location.reload();
                }}
            }});
    }}, 5000);
</script>
</body>
</html>
"#,
        count = view.webhook_count,
    ));
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}
