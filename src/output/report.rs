use super::ResultPage;
use crate::render::escape_html;

fn hidden(visible: bool) -> &'static str {
    if visible {
        ""
    } else {
        r#" style="display:none""#
    }
}

fn table_html(page: &ResultPage<'_>) -> String {
    let columns = page.table.columns();
    let mut out = String::new();
    out.push_str("<table id=\"results\" class=\"min-w-full text-sm\">\n<thead><tr>");
    for c in columns {
        out.push_str(&format!(
            r#"<th id="{key}_col_head" class="{key}_col px-4 py-3 text-left font-bold"{style}>{label}</th>"#,
            key = c.key,
            style = hidden(c.visible),
            label = escape_html(c.label),
        ));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in page.table.rows() {
        out.push_str(&format!(r#"<tr data-id="{}">"#, escape_html(&row.id)));
        for (cell, c) in row.cells.iter().zip(columns) {
            out.push_str(&format!(
                r#"<td class="{key}_col px-4 py-2 align-top"{style}>{html}</td>"#,
                key = c.key,
                style = hidden(c.visible),
                html = cell.html,
            ));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>");
    out
}

fn panel_html(page: &ResultPage<'_>) -> String {
    let mut out = String::new();
    for entry in page.panel {
        out.push_str(&format!(
            r#"<label class="flex items-center gap-2 text-xs"><input type="checkbox" class="column-toggle" data-column="{key}"{checked}/> {label}</label>"#,
            key = entry.key,
            checked = if entry.checked { " checked" } else { "" },
            label = escape_html(entry.label),
        ));
        out.push('\n');
    }
    out
}

pub fn render_html(page: &ResultPage<'_>) -> Vec<u8> {
    let table = table_html(page);
    let panel = panel_html(page);
    let query = escape_html(page.query);
    let shown = page.table.rows().len();
    let total = page.total;

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Antibody Validation Report Search</title>
  <script src="https://cdn.tailwindcss.com?plugins=forms"></script>
  <style>
    body {{ font-family: 'Inter', sans-serif; }}
    #results a {{ color: #135bec; text-decoration: underline; }}
  </style>
</head>
<body class="bg-slate-50 text-slate-900 min-h-screen">
  <header class="border-b border-slate-200 bg-white px-8 py-4">
    <h1 class="text-2xl font-extrabold">Antibody Validation Report Search</h1>
    <p class="text-sm text-slate-500">Query: <code>{query}</code> &middot; {shown} of {total} reports</p>
  </header>
  <main class="flex gap-8 px-8 py-6">
    <aside class="w-64 shrink-0">
      <h3 class="font-bold mb-2">Additional Columns</h3>
      <div class="flex gap-2 mb-3">
        <button id="set-all" type="button" class="rounded border px-2 py-1 text-xs">Set all</button>
        <button id="clear-all" type="button" class="rounded border px-2 py-1 text-xs">Clear all</button>
      </div>
      <div class="flex flex-col gap-1">
{panel}      </div>
    </aside>
    <section class="overflow-x-auto rounded-xl border border-slate-200 bg-white">
{table}
    </section>
  </main>

  <script>
    (function() {{
      function showColumn(key, visible) {{
        const display = visible ? '' : 'none';
        document.querySelectorAll(`.${{key}}_col`).forEach((el) => {{
          el.style.display = display;
        }});
      }}

      const toggles = Array.from(document.querySelectorAll('.column-toggle'));
      for (const box of toggles) {{
        box.addEventListener('change', () => showColumn(box.dataset.column, box.checked));
      }}

      function setAll(visible) {{
        for (const box of toggles) {{
          box.checked = visible;
          showColumn(box.dataset.column, visible);
        }}
      }}

      document.getElementById('set-all').addEventListener('click', () => setAll(true));
      document.getElementById('clear-all').addEventListener('click', () => setAll(false));
    }})();
  </script>
</body>
</html>
"####
    );
    html.into_bytes()
}
