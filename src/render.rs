//! Self-contained HTML output for a [`DashboardView`].
//!
//! No external chart library: bars are sized `div`s. Panel visibility and the
//! active nav link come from the [`TabController`]; the embedded script only
//! repeats the same transition on clicks.

use crate::tabs::TabController;
use crate::view::{BarChart, DashboardView, Legend, LogTable, PersonaCard};

const PALETTE: [&str; 6] = ["#3b82f6", "#10b981", "#f59e0b", "#8b5cf6", "#ef4444", "#14b8a6"];

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON safe to place inside a `<script>` element. Markup characters only
/// occur inside JSON strings, where the `\u` forms are equivalent.
fn script_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

pub fn render_dashboard(view: &DashboardView, tabs: &TabController) -> serde_json::Result<String> {
    let data = serde_json::to_string(view)?;
    Ok(fill_template(
        TEMPLATE,
        &[
            ("__TITLE__", escape_html(&view.title)),
            ("__GENERATED__", escape_html(&view.generated_at)),
            ("__NAV__", render_nav(tabs)),
            ("__PANELS__", render_panels(view, tabs)),
            ("__DASHBOARD_DATA__", script_json(&data)),
        ],
    ))
}

/// Substitute placeholders in one pass so inserted text is never rescanned.
fn fill_template(template: &str, slots: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find("__") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match slots.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push_str("__");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn render_nav(tabs: &TabController) -> String {
    let active = tabs.active_links();
    tabs.panels()
        .iter()
        .map(|p| {
            let href = p.href();
            let class = if active.contains(&href) { " class=\"active\"" } else { "" };
            format!(
                "<a href=\"{}\"{}>{}</a>",
                escape_html(&href),
                class,
                escape_html(&p.title)
            )
        })
        .collect::<Vec<_>>()
        .join("\n      ")
}

fn render_panels(view: &DashboardView, tabs: &TabController) -> String {
    tabs.panels()
        .iter()
        .map(|p| {
            let body = match p.name.as_str() {
                "dashboard" => render_charts(&view.charts),
                "personas" => render_cards(&view.cards),
                "logs" => render_table(&view.table),
                _ => String::new(),
            };
            let display = if tabs.is_visible(&p.name) { "block" } else { "none" };
            format!(
                "<section class=\"view\" id=\"{}\" style=\"display:{}\">\n<h2>{}</h2>\n{}\n</section>",
                escape_html(&p.name),
                display,
                escape_html(&p.title),
                body
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_cards(cards: &[PersonaCard]) -> String {
    if cards.is_empty() {
        return "<div class=\"empty\">No personas loaded</div>".to_string();
    }
    let mut out = String::from("<div id=\"persona-cards\" class=\"cards\">\n");
    for card in cards {
        let kv: String = card
            .demographics
            .iter()
            .map(|kv| {
                format!(
                    "<div class=\"kv\"><div>{}</div><div>{}</div></div>",
                    escape_html(&kv.key),
                    escape_html(&kv.value)
                )
            })
            .collect();
        out.push_str(&format!(
            "<div class=\"persona-card\" style=\"border-top-color:{accent}\">\
             <img src=\"{src}\" alt=\"{alt}\">\
             <div class=\"card-body\"><div class=\"badge\">{badge}</div>{kv}\
             <div class=\"small\">{desc}</div>{goals}{frustrations}</div></div>\n",
            accent = escape_html(&card.accent),
            src = escape_html(&card.image_path),
            alt = escape_html(&card.image_alt),
            badge = escape_html(&card.badge),
            kv = kv,
            desc = escape_html(&card.description),
            goals = render_list("Goals", &card.goals),
            frustrations = render_list("Frustrations", &card.frustrations),
        ));
    }
    out.push_str("</div>");
    out
}

fn render_list(title: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let lis: String = items
        .iter()
        .map(|i| format!("<li>{}</li>", escape_html(i)))
        .collect();
    format!("<div class=\"list-title\">{}</div><ul class=\"small\">{}</ul>", title, lis)
}

fn render_table(table: &LogTable) -> String {
    let head: String = table
        .columns
        .iter()
        .map(|c| format!("<th>{}</th>", escape_html(c)))
        .collect();
    let body: String = table
        .rows
        .iter()
        .map(|r| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><span class=\"small\">{}</span></td></tr>\n",
                escape_html(&r.persona),
                escape_html(&r.task),
                r.steps,
                r.errors,
                r.success,
                escape_html(&r.actions)
            )
        })
        .collect();
    format!(
        "<div class=\"caption\">Showing {} of {} runs</div>\n\
         <div class=\"table-wrap\"><table><thead><tr>{}</tr></thead>\n<tbody id=\"logs-body\">\n{}</tbody></table></div>",
        table.rows.len(),
        table.total_rows,
        head,
        body
    )
}

fn render_charts(charts: &[BarChart]) -> String {
    charts.iter().map(render_chart).collect::<Vec<_>>().join("\n")
}

fn bar_pct(value: f64, scale: f64) -> f64 {
    if scale > 0.0 {
        (value / scale * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn render_bar(label: &str, value: f64, scale: f64, color: &str) -> String {
    format!(
        "<div class=\"bar-row\"><span class=\"bar-label\">{}</span>\
         <span class=\"bar-track\"><span class=\"bar-seg\" style=\"width:{:.1}%;background:{}\"></span></span>\
         <span class=\"bar-val\">{}</span></div>\n",
        escape_html(label),
        bar_pct(value, scale),
        color,
        value
    )
}

fn render_chart(chart: &BarChart) -> String {
    let scale = chart.scale();
    let mut body = String::new();
    if chart.labels.is_empty() {
        body.push_str("<div class=\"empty\">No data</div>\n");
    } else if chart.datasets.len() == 1 {
        let data = &chart.datasets[0].data;
        for (i, label) in chart.labels.iter().enumerate() {
            body.push_str(&render_bar(label, data[i], scale, PALETTE[i % PALETTE.len()]));
        }
    } else {
        for (col, label) in chart.labels.iter().enumerate() {
            body.push_str(&format!("<div class=\"bar-group\">{}</div>\n", escape_html(label)));
            for (i, ds) in chart.datasets.iter().enumerate() {
                let color = PALETTE[i % PALETTE.len()];
                body.push_str(&render_bar(&ds.label, ds.data[col], scale, color));
            }
        }
    }
    if chart.legend == Legend::Bottom {
        let items: String = chart
            .datasets
            .iter()
            .enumerate()
            .map(|(i, ds)| {
                format!(
                    "<span><i style=\"background:{}\"></i>{}</span>",
                    PALETTE[i % PALETTE.len()],
                    escape_html(&ds.label)
                )
            })
            .collect();
        body.push_str(&format!("<div class=\"chart-legend\">{}</div>\n", items));
    }
    format!(
        "<div class=\"chart\" id=\"{}\"><h3>{}</h3>\n{}</div>",
        escape_html(&chart.id),
        escape_html(&chart.title),
        body
    )
}

const TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>__TITLE__</title>
  <style>
    :root {
      --bg: #f8fafc; --bg-raised: #ffffff; --fg: #1f2937; --fg-muted: #6b7280;
      --accent: #4f46e5; --border: #e5e7eb; --radius: 8px;
      --sans: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
    }
    *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
    body { font-family: var(--sans); background: var(--bg); color: var(--fg); line-height: 1.5; }
    header { display: flex; align-items: center; gap: 1.5rem; padding: 0.75rem 1.5rem; background: var(--bg-raised); border-bottom: 1px solid var(--border); }
    header h1 { font-size: 1rem; }
    .nav { display: flex; gap: 0.25rem; }
    .nav a { color: var(--fg-muted); text-decoration: none; padding: 0.3rem 0.7rem; border-radius: 4px; font-size: 0.85rem; }
    .nav a.active { color: var(--accent); background: #eef2ff; }
    .generated { margin-left: auto; font-size: 0.7rem; color: var(--fg-muted); }
    main { max-width: 1200px; margin: 0 auto; padding: 1.5rem; }
    .view h2 { font-size: 1.1rem; margin-bottom: 1rem; }
    .cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 1rem; }
    .persona-card { background: var(--bg-raised); border: 1px solid var(--border); border-top: 4px solid var(--accent); border-radius: var(--radius); overflow: hidden; }
    .persona-card img { width: 100%; display: block; background: var(--border); min-height: 80px; }
    .card-body { padding: 12px 12px 14px 12px; }
    .badge { display: inline-block; padding: 0.1rem 0.5rem; border-radius: 4px; background: #eef2ff; color: var(--accent); font-size: 0.75rem; margin-bottom: 0.5rem; }
    .kv { display: flex; justify-content: space-between; font-size: 0.8rem; border-bottom: 1px dashed var(--border); padding: 0.15rem 0; }
    .kv div:first-child { color: var(--fg-muted); }
    .small { font-size: 0.75rem; color: var(--fg-muted); margin-top: 0.4rem; }
    ul.small { padding-left: 1rem; }
    .list-title { font-size: 0.72rem; font-weight: 600; margin-top: 0.5rem; }
    .caption { font-size: 0.75rem; color: var(--fg-muted); margin-bottom: 0.4rem; }
    .table-wrap { overflow-x: auto; border: 1px solid var(--border); border-radius: var(--radius); background: var(--bg-raised); }
    table { width: 100%; border-collapse: collapse; font-size: 0.8rem; }
    th { text-align: left; padding: 0.5rem 0.7rem; font-size: 0.7rem; text-transform: uppercase; color: var(--fg-muted); border-bottom: 1px solid var(--border); }
    td { padding: 0.4rem 0.7rem; border-bottom: 1px solid var(--border); vertical-align: top; }
    .chart { background: var(--bg-raised); border: 1px solid var(--border); border-radius: var(--radius); padding: 1rem; margin-bottom: 1rem; }
    .chart h3 { font-size: 0.9rem; margin-bottom: 0.6rem; }
    .bar-group { font-size: 0.75rem; font-weight: 600; margin-top: 0.5rem; }
    .bar-row { display: flex; align-items: center; gap: 0.6rem; padding: 0.15rem 0; }
    .bar-label { min-width: 150px; font-size: 0.75rem; text-align: right; color: var(--fg-muted); }
    .bar-track { flex: 1; height: 18px; background: #f1f5f9; border-radius: 4px; overflow: hidden; display: flex; }
    .bar-seg { height: 100%; }
    .bar-val { font-size: 0.75rem; min-width: 50px; }
    .chart-legend { display: flex; gap: 1rem; font-size: 0.72rem; color: var(--fg-muted); margin-top: 0.6rem; justify-content: center; }
    .chart-legend i { display: inline-block; width: 10px; height: 10px; border-radius: 2px; margin-right: 0.3rem; }
    .empty { color: var(--fg-muted); font-style: italic; font-size: 0.8rem; padding: 1rem; text-align: center; border: 1px dashed var(--border); border-radius: var(--radius); }
  </style>
</head>
<body>
  <header>
    <h1>__TITLE__</h1>
    <div class="nav">
      __NAV__
    </div>
    <span class="generated">generated __GENERATED__</span>
  </header>
  <main>
__PANELS__
  </main>
  <script type="application/json" id="dashboard-data">__DASHBOARD_DATA__</script>
  <script>
    (function () {
      var links = document.querySelectorAll(".nav a");
      links.forEach(function (a) {
        a.addEventListener("click", function (e) {
          e.preventDefault();
          var target = a.getAttribute("href").replace("#", "");
          document.querySelectorAll(".view").forEach(function (v) { v.style.display = "none"; });
          document.getElementById(target).style.display = "block";
          links.forEach(function (l) { l.classList.remove("active"); });
          a.classList.add("active");
        });
      });
    })();
  </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ChartDataset;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn script_json_cannot_close_the_tag() {
        let json = serde_json::to_string(&serde_json::json!({"a": "</script> & co"})).unwrap();
        let safe = script_json(&json);
        assert!(!safe.contains('<'));
        let back: serde_json::Value = serde_json::from_str(&safe).unwrap();
        assert_eq!(back["a"], "</script> & co");
    }

    #[test]
    fn placeholders_in_inserted_text_are_left_alone() {
        let out = fill_template(
            "<h1>__TITLE__</h1><p>__BODY__</p>",
            &[("__TITLE__", "__BODY__".to_string()), ("__BODY__", "x".to_string())],
        );
        assert_eq!(out, "<h1>__BODY__</h1><p>x</p>");
    }

    #[test]
    fn bar_width_is_relative_to_scale() {
        assert_eq!(bar_pct(5.0, 10.0), 50.0);
        assert_eq!(bar_pct(3.0, 0.0), 0.0);
        assert_eq!(bar_pct(12.0, 10.0), 100.0);
    }

    #[test]
    fn grouped_chart_renders_one_bar_per_persona_per_task() {
        let chart = BarChart {
            id: "chart-steps".into(),
            title: "Steps".into(),
            labels: vec!["Login".into(), "Checkout".into()],
            datasets: vec![
                ChartDataset { label: "A".into(), data: vec![1.0, 2.0] },
                ChartDataset { label: "B".into(), data: vec![3.0, 4.0] },
            ],
            legend: Legend::Bottom,
            max: None,
        };
        let html = render_chart(&chart);
        assert_eq!(html.matches("class=\"bar-row\"").count(), 4);
        assert_eq!(html.matches("class=\"bar-group\"").count(), 2);
        assert!(html.contains("chart-legend"));
        assert!(html.contains("width:100.0%"));
    }
}
