//! Embedded console page, plus the dist directory served when a built
//! frontend exists (the router falls back to it for non-API paths).

use axum::response::Html;

pub const FRONTEND_DIST_DIR: &str = "frontend/dist";

pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>Astrometrics Layer Console</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
  <style>
    body { font-family: Arial, sans-serif; max-width: 960px; margin: 24px auto; padding: 0 12px; }
    h1 { margin-bottom: 8px; }
    .card { border: 1px solid #ddd; border-radius: 8px; padding: 14px; margin: 14px 0; }
    label { display: block; margin: 4px 0; }
    button { padding: 6px 12px; }
    #map { height: 420px; border-radius: 8px; }
    #status { background: #111; color: #aef2ae; padding: 12px; overflow: auto; border-radius: 6px; min-height: 48px; white-space: pre-wrap; }
    .layer-row { display: flex; align-items: center; gap: 8px; margin: 4px 0; }
    .layer-row a { font-size: 0.9rem; }
  </style>
</head>
<body>
  <h1>Astrometrics Layer Console</h1>
  <p>Upload shapefile pairs (.shp + .dbf) or GeoJSON documents; pairs are matched across uploads.</p>

  <div class="card">
    <strong>Upload</strong>
    <div>
      <input id="files" type="file" multiple accept=".shp,.dbf,.geojson,.json" />
      <button id="upload-btn">POST /api/layers</button>
    </div>
  </div>

  <div class="card">
    <strong>Layers</strong>
    <div id="layers">No layers yet.</div>
  </div>

  <div class="card">
    <strong>Pending parts</strong>
    <div id="pending">None.</div>
  </div>

  <div class="card">
    <div id="map"></div>
  </div>

  <pre id="status">Ready.</pre>

  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <script>
    const statusEl = document.getElementById('status');
    const layersEl = document.getElementById('layers');
    const pendingEl = document.getElementById('pending');

    const map = L.map('map').setView([35.6812, 139.7671], 9);
    L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png', {
      attribution: '&copy; OpenStreetMap contributors',
    }).addTo(map);
    let mapLayer = null;

    function report(text) { statusEl.textContent = text; }

    async function refreshMap() {
      const response = await fetch('/api/map');
      if (!response.ok) return;
      const doc = await response.json();
      if (mapLayer) map.removeLayer(mapLayer);
      mapLayer = L.geoJSON(doc).addTo(map);
      const bounds = mapLayer.getBounds();
      if (bounds.isValid()) map.fitBounds(bounds, { padding: [16, 16] });
    }

    async function refreshLayers() {
      const response = await fetch('/api/layers');
      const payload = await response.json();
      const layers = payload.layers || [];
      if (layers.length === 0) { layersEl.textContent = 'No layers yet.'; return; }
      layersEl.innerHTML = '';
      layers.forEach((layer) => {
        const row = document.createElement('div');
        row.className = 'layer-row';
        const checkbox = document.createElement('input');
        checkbox.type = 'checkbox';
        checkbox.checked = layer.visible;
        checkbox.addEventListener('change', async () => {
          await fetch('/api/layers/' + encodeURIComponent(layer.key) + '/visibility', {
            method: 'PUT',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify({ visible: checkbox.checked }),
          });
          refreshMap();
        });
        const label = document.createElement('span');
        label.textContent = layer.key + ' (' + layer.feature_count + ' features)';
        row.appendChild(checkbox);
        row.appendChild(label);
        if (layer.is_converted) {
          const link = document.createElement('a');
          link.href = '/api/layers/' + encodeURIComponent(layer.key) + '/export';
          link.textContent = 'download geojson';
          row.appendChild(link);
        }
        const csv = document.createElement('a');
        csv.href = '/api/layers/' + encodeURIComponent(layer.key) + '/attributes.csv';
        csv.textContent = 'attributes csv';
        row.appendChild(csv);
        layersEl.appendChild(row);
      });
    }

    async function refreshPending() {
      const response = await fetch('/api/pending');
      const payload = await response.json();
      const pending = payload.pending || [];
      if (pending.length === 0) { pendingEl.textContent = 'None.'; return; }
      pendingEl.innerHTML = '';
      pending.forEach((part) => {
        const row = document.createElement('div');
        row.className = 'layer-row';
        const label = document.createElement('span');
        label.textContent = part.file_name + ' (' + part.role + ' part, waiting)';
        row.appendChild(label);
        if (part.role === 'geometry') {
          const button = document.createElement('button');
          button.textContent = 'decode without attributes';
          button.addEventListener('click', async () => {
            const result = await fetch('/api/pending/' + encodeURIComponent(part.base_name) + '/decode', { method: 'POST' });
            report(await result.text());
            refreshAll();
          });
          row.appendChild(button);
        }
        pendingEl.appendChild(row);
      });
    }

    function refreshAll() { refreshLayers(); refreshPending(); refreshMap(); }

    document.getElementById('upload-btn').addEventListener('click', async () => {
      const input = document.getElementById('files');
      if (input.files.length === 0) { report('Pick at least one file.'); return; }
      const body = new FormData();
      for (const file of input.files) body.append('files', file, file.name);
      report('Uploading…');
      const response = await fetch('/api/layers', { method: 'POST', body });
      report('HTTP ' + response.status + '\n' + await response.text());
      refreshAll();
    });

    refreshAll();
  </script>
</body>
</html>
"#;
