//! Browser client served at `/`. It redraws the canvas from every snapshot it
//! receives (live feed or action reply) and posts each button press or canvas
//! click to `/event`.

pub const CLIENT_HTML: &str = r###"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Hexboard</title>
  <style>
    body{font-family:system-ui,sans-serif;margin:12px;background:#222;color:#eee}
    .row{display:flex;gap:16px;align-items:flex-start}
    .panel{display:flex;flex-direction:column;gap:10px;min-width:220px}
    .counters{display:grid;grid-template-columns:auto auto auto auto;gap:4px 8px;align-items:center}
    button{cursor:pointer}
    #notice{min-height:2.5em;font-style:italic}
    #status.down{color:#ff7198}
  </style>
</head>
<body>
  <div class="row">
    <canvas id="canvas" width="900" height="700"></canvas>
    <div class="panel">
      <label>Playing as <select id="color-select"></select></label>
      <div>Dice: <strong id="dice">0 0</strong></div>
      <div>
        <button data-action="roll">Roll</button>
        <button data-action="draw_card">Draw dev card</button>
        <button data-action="undo_card">Undo draw</button>
      </div>
      <div class="counters" id="counters"></div>
      <div id="cards"></div>
      <div id="notice"></div>
      <div>
        <button data-action="new_board">New board</button>
        <button data-action="new_diamond">New diamond</button>
        <button data-action="reset">Reset</button>
      </div>
      <div id="status">connecting</div>
    </div>
  </div>
<script>
const RESOURCES = ['ore', 'sheep', 'wood', 'brick', 'wheat'];
const RADIUS = {2: 13, 3: 18, 4: 20, 5: 22, 6: 30};
let data = {hexagons: [], vertices: [], lines: [], players: {}, dice: [0, 0], rev: 0};

function tokenRadius(n) { return RADIUS[Math.min(n, 14 - n)] || 0; }

function connect() {
  const status = document.getElementById('status');
  const proto = location.protocol === 'https:' ? 'wss' : 'ws';
  const socket = new WebSocket(`${proto}://${location.host}/ws`);
  socket.onopen = () => { status.textContent = 'live'; status.className = ''; };
  socket.onmessage = (msg) => {
    const push = JSON.parse(msg.data);
    if (push.event === 'state_update') { accept(push.payload); }
  };
  socket.onclose = () => {
    status.textContent = 'reconnecting'; status.className = 'down';
    setTimeout(connect, 1000);
  };
}

function accept(state) {
  if (state.rev < data.rev) { return; }
  data = state;
  syncColors();
  draw();
}

function syncColors() {
  const select = document.getElementById('color-select');
  const colors = Object.keys(data.players);
  if (select.options.length === colors.length) { return; }
  const keep = select.value;
  select.innerHTML = '';
  colors.forEach(c => select.add(new Option(c, c)));
  if (colors.includes(keep)) { select.value = keep; }
}

function buildCounters() {
  const box = document.getElementById('counters');
  RESOURCES.forEach(r => {
    box.insertAdjacentHTML('beforeend',
      `<span>${r}</span><strong id="${r}">0</strong>` +
      `<button data-action="add_${r}">+</button><button data-action="remove_${r}">-</button>`);
  });
}

async function handleEvent(event, action) {
  event.preventDefault();
  const color = document.getElementById('color-select').value;
  const coords = canvasCoordinates(event);
  const response = await fetch('/event', {
    method: 'POST',
    headers: {'Content-Type': 'application/json'},
    body: JSON.stringify({action, color, x: coords.x, y: coords.y}),
  });
  const notice = document.getElementById('notice');
  const isJson = (response.headers.get('content-type') || '').includes('application/json');
  const body = isJson ? await response.json() : {error: await response.text()};
  if (!response.ok) { notice.textContent = body.error || response.statusText; return; }
  notice.textContent = body.notice ? `You drew a ${body.notice.card}. ${body.notice.wisdom}` : '';
  accept(body);
}

function canvasCoordinates(event) {
  if (event.target.id !== 'canvas') { return {x: null, y: null}; }
  const rect = event.target.getBoundingClientRect();
  return {x: event.clientX - rect.left, y: event.clientY - rect.top};
}

function draw() {
  const canvas = document.getElementById('canvas');
  const ctx = canvas.getContext('2d');
  ctx.clearRect(0, 0, canvas.width, canvas.height);
  ctx.fillStyle = 'gray';
  ctx.fillRect(0, 0, canvas.width, canvas.height);
  data.hexagons.forEach(h => drawHexagon(ctx, h));
  data.lines.forEach(l => drawLine(ctx, l));
  data.vertices.forEach(v => drawVertex(ctx, v));
  updatePanel();
}

function drawHexagon(ctx, h) {
  ctx.beginPath();
  h.vertices.forEach(([x, y], i) => i === 0 ? ctx.moveTo(x, y) : ctx.lineTo(x, y));
  ctx.closePath();
  ctx.fillStyle = h.color;
  ctx.fill();
  ctx.strokeStyle = 'black';
  ctx.lineWidth = 1;
  ctx.stroke();
  if (h.number !== 7) {
    drawVertex(ctx, {x: h.center[0], y: h.center[1], radius: tokenRadius(h.number), color: '#FFDAB9', outline: true});
    drawText(ctx, String(h.number), h.center[0], h.center[1], '20px Arial', 'black');
  }
}

function drawVertex(ctx, v) {
  ctx.beginPath();
  ctx.arc(v.x, v.y, v.radius, 0, 2 * Math.PI);
  ctx.fillStyle = v.color;
  ctx.fill();
  if (v.outline) {
    ctx.strokeStyle = 'black';
    ctx.lineWidth = 1;
    ctx.stroke();
  }
}

function drawLine(ctx, l) {
  ctx.beginPath();
  ctx.moveTo(l.x1, l.y1);
  ctx.lineTo(l.x2, l.y2);
  ctx.lineTo(l.x3, l.y3);
  ctx.lineTo(l.x4, l.y4);
  ctx.closePath();
  ctx.fillStyle = l.color;
  ctx.fill();
}

function drawText(ctx, text, x, y, font, color) {
  ctx.fillStyle = color;
  ctx.font = font;
  ctx.textAlign = 'center';
  ctx.textBaseline = 'middle';
  ctx.fillText(text, x, y);
}

function updatePanel() {
  const color = document.getElementById('color-select').value;
  const me = data.players[color];
  if (me) {
    RESOURCES.forEach(r => { document.getElementById(r).textContent = me.resources[r] ?? 0; });
  }
  document.getElementById('dice').textContent = `${data.dice[0]} ${data.dice[1]}`;
  document.getElementById('cards').innerHTML = Object.entries(data.players)
    .map(([c, p]) => `<div style="color:${c}">${c}: ${p.num_cards} cards, ${p.dev_cards} dev</div>`)
    .join('');
}

document.addEventListener('DOMContentLoaded', () => {
  buildCounters();
  document.getElementById('color-select').addEventListener('change', draw);
  document.body.addEventListener('click', (event) => {
    if (event.target.tagName === 'BUTTON') {
      const action = event.target.getAttribute('data-action');
      if (action) { handleEvent(event, action); }
    }
  });
  document.getElementById('canvas').addEventListener('click', (e) => handleEvent(e, 'click'));
  fetch('/api/state').then(r => r.json()).then(accept);
  connect();
});
</script>
</body>
</html>
"###;
