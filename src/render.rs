use crate::graph::Graph;

/// Render a self-contained HTML page (graph embedded as JSON) with a small
/// force-directed canvas view.
///
/// The template is spliced with `replace` instead of `format!()` because the
/// JS uses `${x}` template literals, which would clash with Rust formatting.
pub fn render_html(graph: &Graph) -> anyhow::Result<String> {
    // `</` inside the embedded literal would close the script element early.
    let json = serde_json::to_string(graph)?.replace("</", "<\\/");

    const TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Cluster topology</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  .container { display: flex; height: calc(100vh - 58px); }
  .main { flex: 1; position: relative; }
  .sidebar { width: 320px; border-left: 1px solid #ddd; padding: 12px; overflow: auto; }
  .summary { display: flex; gap: 16px; flex-wrap: wrap; font-size: 14px; color: #333; }
  .pill { padding: 4px 8px; border: 1px solid #ddd; border-radius: 999px; background: #fafafa; }
  .muted { color: #777; font-size: 12px; }
  canvas { width: 100%; height: 100%; display: block; }
  table { border-collapse: collapse; width: 100%; margin-top: 8px; }
  td { border-bottom: 1px solid #eee; padding: 4px 6px; font-size: 13px; vertical-align: top; }
  code { font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; font-size: 12px; }
</style>
</head>
<body>
<header>
  <div class="summary" id="summary"></div>
</header>

<div class="container">
  <div class="main"><canvas id="view"></canvas></div>
  <div class="sidebar">
    <h3 id="title">Select a node</h3>
    <div id="meta" class="muted"></div>
    <table id="info"></table>
  </div>
</div>

<script>
// Embedded graph (JSON object literal)
const DATA = __DATA__;

const COLORS = {
  zone: "#8e44ad", net: "#2980b9", bridge: "#16a085", nic: "#7f8c8d",
  host: "#c0392b", vm: "#d35400", disk: "#2c3e50"
};

const canvas = document.getElementById("view");
const ctx = canvas.getContext("2d");
const byId = new Map();
const nodes = DATA.nodes.map((n, i) => {
  const a = (2 * Math.PI * i) / Math.max(1, DATA.nodes.length);
  const v = { ...n, x: Math.cos(a) * 200, y: Math.sin(a) * 200, vx: 0, vy: 0 };
  byId.set(n.id, v);
  return v;
});
const links = DATA.links
  .map(l => ({ s: byId.get(l.source), t: byId.get(l.target) }))
  .filter(l => l.s && l.t);
let selected = null;

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function renderSummary() {
  const counts = {};
  for (const n of DATA.nodes) counts[n.type] = (counts[n.type] || 0) + 1;
  const pills = Object.entries(counts)
    .map(([k, v]) => `<span class="pill">${escapeHtml(k)}: <b>${v}</b></span>`)
    .join("");
  document.getElementById("summary").innerHTML =
    `<span class="pill">nodes: <b>${DATA.nodes.length}</b></span>` +
    `<span class="pill">links: <b>${DATA.links.length}</b></span>` + pills;
}

function step() {
  for (const a of nodes) {
    for (const b of nodes) {
      if (a === b) continue;
      const dx = a.x - b.x, dy = a.y - b.y;
      const d2 = dx * dx + dy * dy + 0.01;
      a.vx += (dx / d2) * 60;
      a.vy += (dy / d2) * 60;
    }
    a.vx -= a.x * 0.002;
    a.vy -= a.y * 0.002;
  }
  for (const { s, t } of links) {
    const dx = t.x - s.x, dy = t.y - s.y;
    s.vx += dx * 0.01; s.vy += dy * 0.01;
    t.vx -= dx * 0.01; t.vy -= dy * 0.01;
  }
  for (const n of nodes) {
    n.vx *= 0.85; n.vy *= 0.85;
    n.x += n.vx; n.y += n.vy;
  }
}

function draw() {
  const w = canvas.width = canvas.clientWidth;
  const h = canvas.height = canvas.clientHeight;
  ctx.clearRect(0, 0, w, h);
  ctx.save();
  ctx.translate(w / 2, h / 2);
  ctx.strokeStyle = "#ccc";
  for (const { s, t } of links) {
    ctx.beginPath(); ctx.moveTo(s.x, s.y); ctx.lineTo(t.x, t.y); ctx.stroke();
  }
  for (const n of nodes) {
    ctx.fillStyle = COLORS[n.type] || "#999";
    ctx.beginPath(); ctx.arc(n.x, n.y, n === selected ? 9 : 6, 0, 2 * Math.PI); ctx.fill();
    ctx.fillStyle = "#333";
    ctx.font = "11px system-ui";
    ctx.fillText(n.name, n.x + 8, n.y + 4);
  }
  ctx.restore();
}

function select(n) {
  selected = n;
  document.getElementById("title").textContent = n.name;
  document.getElementById("meta").textContent = `id: ${n.id} | type: ${n.type}`;
  const rows = Object.entries(n.info || {})
    .map(([k, v]) => `<tr><td>${escapeHtml(k)}</td><td><code>${escapeHtml(JSON.stringify(v))}</code></td></tr>`)
    .join("");
  document.getElementById("info").innerHTML = rows;
}

canvas.addEventListener("click", (e) => {
  const r = canvas.getBoundingClientRect();
  const x = e.clientX - r.left - canvas.width / 2;
  const y = e.clientY - r.top - canvas.height / 2;
  let best = null, bestD = 144;
  for (const n of nodes) {
    const d = (n.x - x) ** 2 + (n.y - y) ** 2;
    if (d < bestD) { best = n; bestD = d; }
  }
  if (best) select(best);
});

renderSummary();
(function loop(i) {
  if (i < 400) step();
  draw();
  requestAnimationFrame(() => loop(i + 1));
})(0);
</script>
</body>
</html>
"##;

    Ok(TEMPLATE.replace("__DATA__", &json))
}
