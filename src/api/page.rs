pub(super) const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>LLM Chat</title>
<style>
  body {
    margin: 0;
    font-family: system-ui, sans-serif;
    background-color: #0e1117;
    color: white;
  }
  main {
    max-width: 760px;
    margin: 0 auto;
    padding: 24px 16px 96px;
  }
  .msg {
    background-color: #1c1f26;
    border-radius: 10px;
    padding: 10px 14px;
    margin: 10px 0;
    white-space: pre-wrap;
  }
  .msg.user { border-left: 3px solid #4a90e2; }
  .msg.assistant { border-left: 3px solid #2ecc71; }
  .msg.thinking { opacity: 0.6; font-style: italic; }
  .welcome { color: #9aa0a6; }
  #error {
    display: none;
    background-color: #3b1219;
    border: 1px solid #e5484d;
    border-radius: 10px;
    padding: 10px 14px;
    margin: 10px 0;
  }
  form {
    position: fixed;
    bottom: 0;
    left: 0;
    right: 0;
    display: flex;
    gap: 8px;
    padding: 16px;
    background-color: #0e1117;
  }
  input {
    flex: 1;
    background-color: #1c1f26;
    color: white;
    border: 1px solid #333;
    border-radius: 10px;
    padding: 10px;
  }
  button {
    background-color: #4a90e2;
    color: white;
    border: none;
    border-radius: 10px;
    padding: 10px 16px;
  }
</style>
</head>
<body>
<main>
  <h1>🤖 LLM Chat Assistant</h1>
  <p class="welcome">🤖 Welcome to LLM Chat! Ask me anything.</p>
  <div id="messages"></div>
  <div id="error"></div>
</main>
<form id="chat">
  <input id="input" autocomplete="off" placeholder="Ask anything...">
  <button type="submit">Send</button>
</form>
<script>
  const messages = document.getElementById('messages');
  const errorBox = document.getElementById('error');
  const input = document.getElementById('input');
  let sessionId = null;

  function add(role, text) {
    const div = document.createElement('div');
    div.className = 'msg ' + role;
    div.textContent = text;
    messages.appendChild(div);
    window.scrollTo(0, document.body.scrollHeight);
    return div;
  }

  function showError(text) {
    errorBox.textContent = text;
    errorBox.style.display = 'block';
  }

  function hideError() {
    errorBox.style.display = 'none';
  }

  async function start() {
    try {
      const res = await fetch('/api/sessions', { method: 'POST' });
      if (!res.ok) {
        showError(await res.text());
        return;
      }
      const session = await res.json();
      sessionId = session.id;
      session.messages.forEach(m => add(m.role, m.content));
    } catch (e) {
      showError('❌ Error: ' + e);
    }
  }

  document.getElementById('chat').addEventListener('submit', async (event) => {
    event.preventDefault();
    const content = input.value;
    if (!content.trim()) return;
    if (!sessionId) {
      showError('❌ Error: this chat has ended. Reload the page to start a new one.');
      return;
    }
    input.value = '';
    hideError();
    add('user', content);
    const pending = add('assistant thinking', 'Thinking...');
    input.disabled = true;
    try {
      const res = await fetch(`/api/sessions/${sessionId}/messages`, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ content }),
      });
      if (res.ok) {
        const body = await res.json();
        pending.textContent = body.reply;
        pending.className = 'msg assistant';
      } else {
        pending.remove();
        if (res.status === 404) sessionId = null;
        showError(await res.text());
      }
    } catch (e) {
      pending.remove();
      showError('❌ Error: ' + e);
    } finally {
      input.disabled = false;
      input.focus();
    }
  });

  window.addEventListener('pagehide', () => {
    if (sessionId) {
      navigator.sendBeacon(`/api/sessions/${sessionId}/end`);
      sessionId = null;
    }
  });

  // A page restored from the back/forward cache already ended its session.
  window.addEventListener('pageshow', (event) => {
    if (event.persisted && !sessionId) {
      messages.replaceChildren();
      hideError();
      start();
    }
  });

  start();
</script>
</body>
</html>
"##;
