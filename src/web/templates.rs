//! Embedded HTML templates for the kiro-pool web UI.
//!
//! All templates are defined as `&str` constants and rendered via minijinja.
//! The UI uses a dark theme with inline CSS -- no external assets required.

/// Base layout template. All pages extend this.
pub const LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{% block title %}kiro-pool{% endblock %} - Credential Pool</title>
    <style>
        :root {
            --bg-primary: #0f1117;
            --bg-secondary: #1a1d27;
            --bg-tertiary: #242736;
            --border: #2e3245;
            --text-primary: #e1e4ed;
            --text-secondary: #8b8fa3;
            --text-muted: #5f6375;
            --accent: #6366f1;
            --accent-hover: #818cf8;
            --success: #22c55e;
            --warning: #f59e0b;
            --danger: #ef4444;
            --info: #3b82f6;
            --radius: 8px;
            --shadow: 0 1px 3px rgba(0,0,0,0.4);
        }
        *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
            min-height: 100vh;
        }
        a { color: var(--accent); text-decoration: none; }
        a:hover { color: var(--accent-hover); }

        /* Navigation */
        .navbar {
            background: var(--bg-secondary);
            border-bottom: 1px solid var(--border);
            padding: 0 1.5rem;
            display: flex;
            align-items: center;
            height: 56px;
            position: sticky;
            top: 0;
            z-index: 100;
        }
        .navbar-brand {
            font-size: 1.25rem;
            font-weight: 700;
            color: var(--text-primary);
            margin-right: 2rem;
            letter-spacing: -0.02em;
        }
        .navbar-brand span { color: var(--accent); }
        .nav-links { display: flex; gap: 0.25rem; flex: 1; }
        .nav-link {
            padding: 0.5rem 0.875rem;
            border-radius: var(--radius);
            color: var(--text-secondary);
            font-size: 0.875rem;
            font-weight: 500;
            transition: all 0.15s;
        }
        .nav-link:hover { color: var(--text-primary); background: var(--bg-tertiary); }
        .nav-link.active { color: var(--accent); background: rgba(99,102,241,0.1); }
        .nav-user { font-size: 0.8125rem; color: var(--text-muted); }
        .nav-user .logout-btn {
            background: none;
            border: none;
            color: var(--text-secondary);
            cursor: pointer;
            font-size: 0.8125rem;
            padding: 0.25rem 0.5rem;
            border-radius: 4px;
            margin-left: 0.5rem;
        }
        .nav-user .logout-btn:hover { color: var(--danger); background: rgba(239,68,68,0.1); }

        /* Main content */
        .container { max-width: 1200px; margin: 0 auto; padding: 1.5rem; }
        .page-header { margin-bottom: 1.5rem; }
        .page-header h1 { font-size: 1.5rem; font-weight: 600; letter-spacing: -0.02em; }
        .page-header p { color: var(--text-secondary); font-size: 0.875rem; margin-top: 0.25rem; }

        /* Cards */
        .card {
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: var(--radius);
            padding: 1.25rem;
            box-shadow: var(--shadow);
        }
        .card-header {
            font-size: 0.875rem;
            font-weight: 600;
            text-transform: uppercase;
            letter-spacing: 0.05em;
            color: var(--text-secondary);
            margin-bottom: 1rem;
            padding-bottom: 0.75rem;
            border-bottom: 1px solid var(--border);
        }
        .card-grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
            gap: 1rem;
        }

        /* Stat blocks */
        .stat { text-align: center; padding: 1rem 0.5rem; }
        .stat-value { font-size: 2rem; font-weight: 700; line-height: 1.2; letter-spacing: -0.03em; }
        .stat-label {
            font-size: 0.75rem;
            color: var(--text-secondary);
            text-transform: uppercase;
            letter-spacing: 0.05em;
            margin-top: 0.25rem;
        }
        .stat-value.success { color: var(--success); }
        .stat-value.warning { color: var(--warning); }
        .stat-value.danger { color: var(--danger); }
        .stat-value.info { color: var(--info); }

        /* Tables */
        .table-wrap { overflow-x: auto; }
        table { width: 100%; border-collapse: collapse; font-size: 0.875rem; }
        th {
            text-align: left;
            padding: 0.625rem 0.75rem;
            font-weight: 600;
            color: var(--text-secondary);
            border-bottom: 1px solid var(--border);
            font-size: 0.75rem;
            text-transform: uppercase;
            letter-spacing: 0.05em;
        }
        td { padding: 0.625rem 0.75rem; border-bottom: 1px solid var(--border); color: var(--text-primary); }
        tr:last-child td { border-bottom: none; }
        tr:hover td { background: rgba(255,255,255,0.02); }

        /* Badges */
        .badge {
            display: inline-block;
            padding: 0.125rem 0.5rem;
            border-radius: 9999px;
            font-size: 0.75rem;
            font-weight: 600;
            letter-spacing: 0.02em;
        }
        .badge-success { background: rgba(34,197,94,0.15); color: var(--success); }
        .badge-warning { background: rgba(245,158,11,0.15); color: var(--warning); }
        .badge-danger { background: rgba(239,68,68,0.15); color: var(--danger); }
        .badge-info { background: rgba(59,130,246,0.15); color: var(--info); }
        .badge-muted { background: rgba(95,99,117,0.2); color: var(--text-muted); }

        /* Buttons */
        .btn {
            display: inline-flex;
            align-items: center;
            gap: 0.375rem;
            padding: 0.5rem 1rem;
            border: 1px solid var(--border);
            border-radius: var(--radius);
            background: var(--bg-tertiary);
            color: var(--text-primary);
            font-size: 0.875rem;
            font-weight: 500;
            cursor: pointer;
            transition: all 0.15s;
        }
        .btn:hover { border-color: var(--text-muted); background: var(--bg-secondary); }
        .btn-primary { background: var(--accent); border-color: var(--accent); color: #fff; }
        .btn-primary:hover { background: var(--accent-hover); border-color: var(--accent-hover); }
        .btn-danger { background: var(--danger); border-color: var(--danger); color: #fff; }
        .btn-danger:hover { background: #dc2626; border-color: #dc2626; }
        .btn-sm { padding: 0.25rem 0.625rem; font-size: 0.8125rem; }
        .btn:disabled { opacity: 0.5; cursor: not-allowed; }

        /* Forms */
        .form-group { margin-bottom: 1rem; }
        .form-label {
            display: block;
            font-size: 0.8125rem;
            font-weight: 500;
            color: var(--text-secondary);
            margin-bottom: 0.375rem;
        }
        .form-input {
            width: 100%;
            padding: 0.5rem 0.75rem;
            background: var(--bg-primary);
            border: 1px solid var(--border);
            border-radius: var(--radius);
            color: var(--text-primary);
            font-size: 0.875rem;
            transition: border-color 0.15s;
        }
        .form-input:focus {
            outline: none;
            border-color: var(--accent);
            box-shadow: 0 0 0 2px rgba(99,102,241,0.25);
        }
        textarea.form-input { min-height: 160px; resize: vertical; }

        /* Progress bar */
        .progress { height: 6px; background: var(--bg-primary); border-radius: 3px; overflow: hidden; margin-top: 0.5rem; }
        .progress-bar { height: 100%; border-radius: 3px; transition: width 0.3s ease; }
        .progress-bar.success { background: var(--success); }
        .progress-bar.warning { background: var(--warning); }
        .progress-bar.danger { background: var(--danger); }

        /* Toasts */
        #toast-stack {
            position: fixed;
            bottom: 1.5rem;
            right: 1.5rem;
            display: flex;
            flex-direction: column;
            gap: 0.5rem;
            z-index: 200;
            max-width: 380px;
        }
        .toast {
            padding: 0.75rem 1rem;
            border-radius: var(--radius);
            font-size: 0.875rem;
            box-shadow: var(--shadow);
            border: 1px solid var(--border);
            background: var(--bg-secondary);
            animation: toast-in 0.2s ease;
        }
        .toast-success { border-color: rgba(34,197,94,0.4); color: var(--success); }
        .toast-error { border-color: rgba(239,68,68,0.4); color: var(--danger); }
        .toast-info { border-color: rgba(59,130,246,0.4); color: var(--info); }
        @keyframes toast-in { from { opacity: 0; transform: translateY(6px); } to { opacity: 1; transform: none; } }

        /* Utility */
        .text-success { color: var(--success); }
        .text-warning { color: var(--warning); }
        .text-danger { color: var(--danger); }
        .text-muted { color: var(--text-muted); }
        .text-secondary { color: var(--text-secondary); }
        .mt-1 { margin-top: 0.5rem; }
        .mt-2 { margin-top: 1rem; }
        .mb-1 { margin-bottom: 0.5rem; }
        .mb-2 { margin-bottom: 1rem; }
        .flex { display: flex; }
        .items-center { align-items: center; }
        .justify-between { justify-content: space-between; }
        .gap-1 { gap: 0.5rem; }
        .hidden { display: none; }
        .mono { font-family: 'SF Mono', SFMono-Regular, Consolas, monospace; font-size: 0.8125rem; }
        .empty-state { text-align: center; padding: 3rem 1rem; color: var(--text-muted); }
        .empty-state p { font-size: 0.875rem; margin-top: 0.5rem; }

        /* Responsive */
        @media (max-width: 768px) {
            .navbar { padding: 0 1rem; }
            .nav-links { gap: 0; }
            .nav-link { padding: 0.5rem 0.5rem; font-size: 0.8125rem; }
            .container { padding: 1rem; }
            .card-grid { grid-template-columns: 1fr; }
            .nav-user { display: none; }
        }
    </style>
</head>
<body>
    {% block body %}{% endblock %}
    <div id="toast-stack"></div>

    <script>
        // Shared utilities
        const POOL = {
            getKey() {
                return sessionStorage.getItem('pool_operator_key') || '';
            },
            setKey(key) {
                sessionStorage.setItem('pool_operator_key', key);
            },
            clearKey() {
                sessionStorage.removeItem('pool_operator_key');
            },
            isLoggedIn() {
                return !!this.getKey();
            },
            headers() {
                return {
                    'Authorization': 'Bearer ' + this.getKey(),
                    'Content-Type': 'application/json',
                };
            },
            async apiFetch(url, options = {}) {
                const resp = await fetch(url, {
                    ...options,
                    headers: { ...this.headers(), ...(options.headers || {}) },
                });
                if (resp.status === 401) {
                    this.clearKey();
                    window.location.href = '/ui/login';
                    return null;
                }
                return resp;
            },
            logout() {
                this.clearKey();
                window.location.href = '/ui/login';
            },
            requireAuth() {
                if (!this.isLoggedIn()) {
                    window.location.href = '/ui/login';
                    return false;
                }
                return true;
            },
            toast(message, level = 'info', ms = 5000) {
                const el = document.createElement('div');
                el.className = 'toast toast-' + level;
                el.textContent = message;
                document.getElementById('toast-stack').appendChild(el);
                setTimeout(() => el.remove(), ms);
            },
            async errorText(resp) {
                try {
                    const body = await resp.json();
                    return (body.error && body.error.message) || resp.statusText;
                } catch (e) {
                    return resp.statusText;
                }
            },
            esc(s) {
                const div = document.createElement('div');
                div.textContent = s == null ? '' : String(s);
                return div.innerHTML;
            },
            timeAgo(dateStr) {
                const date = new Date(dateStr + 'Z');
                const now = new Date();
                const secs = Math.floor((now - date) / 1000);
                if (secs < 60) return secs + 's ago';
                if (secs < 3600) return Math.floor(secs / 60) + 'm ago';
                if (secs < 86400) return Math.floor(secs / 3600) + 'h ago';
                return Math.floor(secs / 86400) + 'd ago';
            }
        };
    </script>
    {% block scripts %}{% endblock %}
</body>
</html>"#;

/// Login page template.
pub const LOGIN: &str = r#"{% extends "layout" %}
{% block title %}Login{% endblock %}
{% block body %}
<div style="display:flex;align-items:center;justify-content:center;min-height:100vh;padding:1rem;">
    <div class="card" style="width:100%;max-width:400px;">
        <div style="text-align:center;margin-bottom:1.5rem;">
            <h1 style="font-size:1.5rem;font-weight:700;letter-spacing:-0.02em;">
                <span style="color:var(--accent);">kiro-pool</span>
            </h1>
            <p class="text-secondary" style="font-size:0.875rem;margin-top:0.25rem;">Credential Pool Dashboard</p>
        </div>
        <div id="login-error" class="toast toast-error hidden" style="margin-bottom:1rem;"></div>
        <form id="login-form">
            <div class="form-group">
                <label class="form-label" for="operator-key">Operator Key</label>
                <input class="form-input mono" type="password" id="operator-key"
                       placeholder="sk-pool-..." autocomplete="off" autofocus>
            </div>
            <button type="submit" class="btn btn-primary" style="width:100%;">Sign In</button>
        </form>
        <p class="text-muted" style="text-align:center;font-size:0.75rem;margin-top:1rem;">
            The key was printed to the server console on first run.
        </p>
    </div>
</div>
{% endblock %}
{% block scripts %}
<script>
    document.getElementById('login-form').addEventListener('submit', async (e) => {
        e.preventDefault();
        const key = document.getElementById('operator-key').value.trim();
        const errEl = document.getElementById('login-error');
        errEl.classList.add('hidden');

        if (!key) {
            errEl.textContent = 'Please enter an operator key.';
            errEl.classList.remove('hidden');
            return;
        }

        try {
            const resp = await fetch('/admin/strategy', {
                headers: { 'Authorization': 'Bearer ' + key }
            });
            // Anything but a 401 means the key was accepted -- a 502 here is
            // the pool core being down, not a bad key.
            if (resp.status !== 401) {
                POOL.setKey(key);
                window.location.href = '/ui/dashboard';
            } else {
                errEl.textContent = 'Invalid operator key. Please try again.';
                errEl.classList.remove('hidden');
            }
        } catch (err) {
            errEl.textContent = 'Connection error. Is the server running?';
            errEl.classList.remove('hidden');
        }
    });

    // If already logged in, redirect
    if (POOL.isLoggedIn()) {
        window.location.href = '/ui/dashboard';
    }
</script>
{% endblock %}"#;

/// Dashboard page template: pool listing, stats, strategy toggle.
pub const DASHBOARD: &str = r#"{% extends "layout" %}
{% block title %}Dashboard{% endblock %}
{% block body %}
<nav class="navbar">
    <a class="navbar-brand" href="/ui/dashboard"><span>kiro-pool</span></a>
    <div class="nav-links">
        <a class="nav-link active" href="/ui/dashboard">Dashboard</a>
        <a class="nav-link" href="/ui/import">Import</a>
        <a class="nav-link" href="/ui/activity">Activity</a>
    </div>
    <div class="nav-user">
        <button class="logout-btn" onclick="POOL.logout()">Logout</button>
    </div>
</nav>
<div class="container">
    <div class="page-header flex justify-between items-center">
        <div>
            <h1>Credential Pool</h1>
            <p>Accounts available to the pool core</p>
        </div>
        <div class="flex gap-1 items-center">
            <span class="text-secondary" style="font-size:0.8125rem;">Balancing:</span>
            <button class="btn btn-sm" id="strategy-btn" onclick="toggleStrategy()">--</button>
        </div>
    </div>

    <!-- Stats row -->
    <div class="card-grid mb-2">
        <div class="card">
            <div class="stat">
                <div class="stat-value info" id="stat-total">--</div>
                <div class="stat-label">Credentials</div>
            </div>
        </div>
        <div class="card">
            <div class="stat">
                <div class="stat-value success" id="stat-enabled">--</div>
                <div class="stat-label">Enabled</div>
            </div>
        </div>
        <div class="card">
            <div class="stat">
                <div class="stat-value warning" id="stat-disabled">--</div>
                <div class="stat-label">Disabled</div>
            </div>
        </div>
        <div class="card">
            <div class="stat">
                <div class="stat-value danger" id="stat-failures">--</div>
                <div class="stat-label">Recorded Failures</div>
            </div>
        </div>
    </div>

    <!-- Pool actions -->
    <div class="card mb-2">
        <div class="flex justify-between items-center">
            <div class="card-header" style="margin:0;padding:0;border:none;">Pool Actions</div>
            <div class="flex gap-1">
                <button class="btn btn-sm" onclick="startSweep('verify')">Verify All</button>
                <button class="btn btn-sm btn-danger" onclick="startSweep('delete-disabled')">Delete Disabled</button>
            </div>
        </div>
        <div id="sweep-progress" class="hidden mt-1">
            <div class="flex justify-between">
                <span class="text-secondary" style="font-size:0.8125rem;" id="sweep-label">Running...</span>
                <button class="btn btn-sm" id="sweep-cancel">Cancel</button>
            </div>
            <div class="progress"><div class="progress-bar success" id="sweep-bar" style="width:0%"></div></div>
        </div>
    </div>

    <!-- Add credential -->
    <div class="card mb-2">
        <div class="card-header">Add Credential</div>
        <form id="add-form" class="flex gap-1" style="flex-wrap:wrap;">
            <input class="form-input mono" style="flex:2;min-width:240px;" type="password"
                   id="add-token" placeholder="Refresh token" autocomplete="off">
            <input class="form-input" style="flex:1;min-width:160px;" type="text"
                   id="add-email" placeholder="Email (optional)">
            <button type="submit" class="btn btn-primary">Add</button>
        </form>
    </div>

    <!-- Credential table -->
    <div class="card">
        <div class="card-header">Credentials</div>
        <div class="table-wrap">
            <table>
                <thead>
                    <tr>
                        <th>Email</th>
                        <th>Fingerprint</th>
                        <th>Status</th>
                        <th>Failures</th>
                        <th>Balance</th>
                        <th>Actions</th>
                    </tr>
                </thead>
                <tbody id="credential-table">
                    <tr><td colspan="6" class="text-muted">Loading...</td></tr>
                </tbody>
            </table>
        </div>
    </div>
</div>
{% endblock %}
{% block scripts %}
<script>
    if (!POOL.requireAuth()) throw new Error('Not authenticated');

    let currentMode = null;

    async function loadStrategy() {
        const resp = await POOL.apiFetch('/admin/strategy');
        if (resp && resp.ok) {
            const body = await resp.json();
            currentMode = body.mode;
            document.getElementById('strategy-btn').textContent =
                currentMode === 'round_robin' ? 'Round Robin' : 'Least Used';
        }
    }

    async function toggleStrategy() {
        const next = currentMode === 'round_robin' ? 'least_used' : 'round_robin';
        const resp = await POOL.apiFetch('/admin/strategy', {
            method: 'PUT',
            body: JSON.stringify({ mode: next }),
        });
        if (resp && resp.ok) {
            const body = await resp.json();
            currentMode = body.mode;
            document.getElementById('strategy-btn').textContent =
                currentMode === 'round_robin' ? 'Round Robin' : 'Least Used';
            POOL.toast('Balancing strategy set to ' + currentMode, 'success');
        } else if (resp) {
            POOL.toast('Strategy change failed: ' + await POOL.errorText(resp), 'error');
        }
    }

    async function loadCredentials() {
        const resp = await POOL.apiFetch('/admin/credentials');
        if (!resp) return;
        if (!resp.ok) {
            POOL.toast('Failed to load pool: ' + await POOL.errorText(resp), 'error');
            return;
        }
        const creds = await resp.json();

        document.getElementById('stat-total').textContent = creds.length;
        document.getElementById('stat-enabled').textContent = creds.filter(c => !c.disabled).length;
        document.getElementById('stat-disabled').textContent = creds.filter(c => c.disabled).length;
        document.getElementById('stat-failures').textContent =
            creds.reduce((sum, c) => sum + (c.failure_count || 0), 0);

        let rows = '';
        for (const c of creds) {
            const status = c.disabled
                ? '<span class="badge badge-warning">Disabled</span>'
                : '<span class="badge badge-success">Enabled</span>';
            const toggle = c.disabled
                ? '<button class="btn btn-sm" onclick="setDisabled(\'' + c.id + '\', false)">Enable</button>'
                : '<button class="btn btn-sm" onclick="setDisabled(\'' + c.id + '\', true)">Disable</button>';
            rows += '<tr>' +
                '<td>' + POOL.esc(c.email || '--') + '</td>' +
                '<td class="mono">' + POOL.esc((c.token_hash || '').slice(0, 12)) + '</td>' +
                '<td>' + status + '</td>' +
                '<td class="mono">' + (c.failure_count || 0) + '</td>' +
                '<td style="min-width:130px;" id="balance-' + c.id + '" class="text-muted">--</td>' +
                '<td><div class="flex gap-1">' +
                    '<button class="btn btn-sm" onclick="verifyCred(\'' + c.id + '\')">Verify</button>' +
                    toggle +
                    '<button class="btn btn-sm btn-danger" onclick="deleteCred(\'' + c.id + '\')">Delete</button>' +
                '</div></td>' +
                '</tr>';
        }
        document.getElementById('credential-table').innerHTML =
            rows || '<tr><td colspan="6" class="text-muted">Pool is empty. Add or import credentials.</td></tr>';

        // Balances load after the table so a slow core never blocks the listing.
        for (const c of creds) loadBalance(c.id);
    }

    async function loadBalance(id) {
        const resp = await POOL.apiFetch('/admin/credentials/' + encodeURIComponent(id) + '/balance');
        const cell = document.getElementById('balance-' + id);
        if (!cell) return;
        if (resp && resp.ok) {
            const b = await resp.json();
            const cls = b.percent_used > 90 ? 'danger' : (b.percent_used > 70 ? 'warning' : 'success');
            cell.className = 'mono';
            cell.innerHTML = b.used.toFixed(1) + ' / ' + b.limit.toFixed(1) +
                '<div class="progress"><div class="progress-bar ' + cls + '" style="width:' +
                b.percent_used.toFixed(0) + '%"></div></div>';
        } else {
            cell.textContent = 'n/a';
        }
    }

    async function verifyCred(id) {
        const resp = await POOL.apiFetch('/admin/credentials/' + encodeURIComponent(id) + '/verify', { method: 'POST' });
        if (resp && resp.ok) {
            const outcome = await resp.json();
            if (outcome.ok) {
                POOL.toast('Credential verified', 'success');
            } else {
                POOL.toast('Verification failed: ' + (outcome.message || 'rejected'), 'error');
            }
            loadCredentials();
        } else if (resp) {
            POOL.toast('Verify failed: ' + await POOL.errorText(resp), 'error');
        }
    }

    async function setDisabled(id, disabled) {
        const action = disabled ? 'disable' : 'enable';
        const resp = await POOL.apiFetch('/admin/credentials/' + encodeURIComponent(id) + '/' + action, { method: 'POST' });
        if (resp && resp.ok) {
            POOL.toast('Credential ' + action + 'd', 'success');
            loadCredentials();
        } else if (resp) {
            POOL.toast('Failed to ' + action + ': ' + await POOL.errorText(resp), 'error');
        }
    }

    async function deleteCred(id) {
        if (!confirm('Delete this credential permanently?')) return;
        const resp = await POOL.apiFetch('/admin/credentials/' + encodeURIComponent(id), { method: 'DELETE' });
        if (resp && resp.ok) {
            POOL.toast('Credential deleted', 'success');
            loadCredentials();
        } else if (resp) {
            POOL.toast('Delete failed: ' + await POOL.errorText(resp), 'error');
        }
    }

    document.getElementById('add-form').addEventListener('submit', async (e) => {
        e.preventDefault();
        const token = document.getElementById('add-token').value.trim();
        const email = document.getElementById('add-email').value.trim();
        if (!token) { POOL.toast('Enter a refresh token first', 'error'); return; }

        const resp = await POOL.apiFetch('/admin/credentials', {
            method: 'POST',
            body: JSON.stringify({ refresh_token: token, email: email || null }),
        });
        if (resp && resp.ok) {
            POOL.toast('Credential added', 'success');
            document.getElementById('add-token').value = '';
            document.getElementById('add-email').value = '';
            loadCredentials();
        } else if (resp) {
            POOL.toast('Add failed: ' + await POOL.errorText(resp), 'error');
        }
    });

    // -- Sweeps (verify-all / delete-disabled) --

    let sweepTimer = null;

    async function startSweep(which) {
        if (which === 'delete-disabled' && !confirm('Delete every disabled credential?')) return;
        const resp = await POOL.apiFetch('/admin/batches/' + which, { method: 'POST' });
        if (resp && resp.ok) {
            const started = await resp.json();
            document.getElementById('sweep-progress').classList.remove('hidden');
            document.getElementById('sweep-cancel').onclick = () => cancelSweep(started.id);
            pollSweep(started.id);
        } else if (resp) {
            POOL.toast('Could not start: ' + await POOL.errorText(resp), 'error');
        }
    }

    async function cancelSweep(id) {
        await POOL.apiFetch('/admin/batches/' + id + '/cancel', { method: 'POST' });
    }

    function pollSweep(id) {
        if (sweepTimer) clearInterval(sweepTimer);
        sweepTimer = setInterval(async () => {
            const resp = await POOL.apiFetch('/admin/batches/' + id);
            if (!resp || !resp.ok) { clearInterval(sweepTimer); return; }
            const snap = await resp.json();
            const pct = snap.total > 0 ? (snap.processed / snap.total * 100) : 0;
            document.getElementById('sweep-bar').style.width = pct.toFixed(0) + '%';
            document.getElementById('sweep-label').textContent =
                snap.kind.replace('_', ' ') + ': ' + snap.processed + '/' + snap.total;
            if (snap.state !== 'running') {
                clearInterval(sweepTimer);
                document.getElementById('sweep-progress').classList.add('hidden');
                POOL.toast(snap.summary || 'Batch finished', snap.failed > 0 ? 'error' : 'success', 8000);
                loadCredentials();
            }
        }, 1000);
    }

    loadStrategy();
    loadCredentials();
    setInterval(loadCredentials, 60000);
</script>
{% endblock %}"#;

/// Import page template: paste tokens, watch progress, read the summary.
pub const IMPORT: &str = r#"{% extends "layout" %}
{% block title %}Import{% endblock %}
{% block body %}
<nav class="navbar">
    <a class="navbar-brand" href="/ui/dashboard"><span>kiro-pool</span></a>
    <div class="nav-links">
        <a class="nav-link" href="/ui/dashboard">Dashboard</a>
        <a class="nav-link active" href="/ui/import">Import</a>
        <a class="nav-link" href="/ui/activity">Activity</a>
    </div>
    <div class="nav-user">
        <button class="logout-btn" onclick="POOL.logout()">Logout</button>
    </div>
</nav>
<div class="container">
    <div class="page-header">
        <h1>Batch Import</h1>
        <p>One refresh token per line, optionally followed by a comma and an email label</p>
    </div>

    <div class="card mb-2">
        <form id="import-form">
            <div class="form-group">
                <textarea class="form-input mono" id="import-text"
                          placeholder="refresh-token-1&#10;refresh-token-2,alice@example.com&#10;# comment lines are ignored"></textarea>
            </div>
            <div class="flex gap-1">
                <button type="submit" class="btn btn-primary" id="import-start">Start Import</button>
                <button type="button" class="btn hidden" id="import-cancel">Cancel</button>
            </div>
        </form>
    </div>

    <div class="card mb-2 hidden" id="progress-card">
        <div class="card-header">Progress</div>
        <div class="flex justify-between">
            <span id="progress-label" class="text-secondary" style="font-size:0.875rem;">Starting...</span>
            <span id="progress-counts" class="mono text-secondary" style="font-size:0.8125rem;"></span>
        </div>
        <div class="progress"><div class="progress-bar success" id="progress-bar" style="width:0%"></div></div>
    </div>

    <div class="card hidden" id="results-card">
        <div class="card-header">Item Results</div>
        <div class="table-wrap">
            <table>
                <thead>
                    <tr><th>#</th><th>Item</th><th>Outcome</th><th>Detail</th></tr>
                </thead>
                <tbody id="results-table"></tbody>
            </table>
        </div>
    </div>
</div>
{% endblock %}
{% block scripts %}
<script>
    if (!POOL.requireAuth()) throw new Error('Not authenticated');

    const OUTCOME_BADGES = {
        succeeded: '<span class="badge badge-success">Imported</span>',
        skipped: '<span class="badge badge-muted">Duplicate</span>',
        failed: '<span class="badge badge-danger">Failed</span>',
        rolled_back: '<span class="badge badge-warning">Rolled Back</span>',
        rollback_failed: '<span class="badge badge-danger">Rollback Failed</span>',
    };

    let pollTimer = null;

    document.getElementById('import-form').addEventListener('submit', async (e) => {
        e.preventDefault();
        const text = document.getElementById('import-text').value;
        const resp = await POOL.apiFetch('/admin/batches/import', {
            method: 'POST',
            body: JSON.stringify({ text }),
        });
        if (resp && resp.ok) {
            const started = await resp.json();
            document.getElementById('import-start').disabled = true;
            const cancelBtn = document.getElementById('import-cancel');
            cancelBtn.classList.remove('hidden');
            cancelBtn.onclick = () => cancelImport(started.id);
            document.getElementById('progress-card').classList.remove('hidden');
            document.getElementById('results-card').classList.remove('hidden');
            poll(started.id);
        } else if (resp) {
            POOL.toast('Import not started: ' + await POOL.errorText(resp), 'error');
        }
    });

    async function cancelImport(id) {
        const resp = await POOL.apiFetch('/admin/batches/' + id + '/cancel', { method: 'POST' });
        if (resp && resp.ok) POOL.toast('Cancellation requested', 'info');
    }

    function renderItems(snap) {
        let rows = '';
        for (const item of snap.items) {
            rows += '<tr>' +
                '<td class="mono">' + (item.index + 1) + '</td>' +
                '<td>' + POOL.esc(item.label) + '</td>' +
                '<td>' + (OUTCOME_BADGES[item.outcome] || POOL.esc(item.outcome)) + '</td>' +
                '<td class="text-secondary" style="font-size:0.8125rem;">' + POOL.esc(item.detail) + '</td>' +
                '</tr>';
        }
        document.getElementById('results-table').innerHTML =
            rows || '<tr><td colspan="4" class="text-muted">Waiting for the first item...</td></tr>';
    }

    function poll(id) {
        if (pollTimer) clearInterval(pollTimer);
        pollTimer = setInterval(async () => {
            const resp = await POOL.apiFetch('/admin/batches/' + id);
            if (!resp || !resp.ok) { clearInterval(pollTimer); return; }
            const snap = await resp.json();

            const pct = snap.total > 0 ? (snap.processed / snap.total * 100) : 0;
            document.getElementById('progress-bar').style.width = pct.toFixed(0) + '%';
            document.getElementById('progress-label').textContent =
                snap.state === 'running' ? 'Importing...' : 'Finished (' + snap.state + ')';
            document.getElementById('progress-counts').textContent =
                snap.processed + '/' + snap.total +
                ' · ok ' + snap.succeeded + ' · dup ' + snap.skipped + ' · fail ' + snap.failed;
            renderItems(snap);

            if (snap.state !== 'running') {
                clearInterval(pollTimer);
                document.getElementById('import-start').disabled = false;
                document.getElementById('import-cancel').classList.add('hidden');
                POOL.toast(snap.summary || 'Import finished', snap.failed > 0 ? 'error' : 'success', 10000);
            }
        }, 1000);
    }
</script>
{% endblock %}"#;

/// Activity page template: paginated audit log.
pub const ACTIVITY: &str = r#"{% extends "layout" %}
{% block title %}Activity{% endblock %}
{% block body %}
<nav class="navbar">
    <a class="navbar-brand" href="/ui/dashboard"><span>kiro-pool</span></a>
    <div class="nav-links">
        <a class="nav-link" href="/ui/dashboard">Dashboard</a>
        <a class="nav-link" href="/ui/import">Import</a>
        <a class="nav-link active" href="/ui/activity">Activity</a>
    </div>
    <div class="nav-user">
        <button class="logout-btn" onclick="POOL.logout()">Logout</button>
    </div>
</nav>
<div class="container">
    <div class="page-header">
        <h1>Activity</h1>
        <p>Recorded admin actions and batch outcomes</p>
    </div>

    <div class="card mb-2">
        <div class="flex gap-1 items-center">
            <label class="form-label" style="margin:0;">Kind</label>
            <select class="form-input" style="width:auto;" id="filter-kind" onchange="page=1;loadActivity()">
                <option value="">All</option>
                <option value="add">add</option>
                <option value="delete">delete</option>
                <option value="disable">disable</option>
                <option value="enable">enable</option>
                <option value="verify">verify</option>
                <option value="import">import</option>
                <option value="verify_all">verify_all</option>
                <option value="delete_disabled">delete_disabled</option>
                <option value="strategy">strategy</option>
            </select>
        </div>
    </div>

    <div class="card">
        <div class="card-header">Log</div>
        <div class="table-wrap">
            <table>
                <thead>
                    <tr><th>Time</th><th>Kind</th><th>Subject</th><th>Outcome</th><th>Detail</th></tr>
                </thead>
                <tbody id="activity-table">
                    <tr><td colspan="5" class="text-muted">Loading...</td></tr>
                </tbody>
            </table>
        </div>
        <div class="flex justify-between items-center mt-2">
            <button class="btn btn-sm" id="prev-btn" onclick="page--;loadActivity()">Prev</button>
            <span class="text-secondary" style="font-size:0.8125rem;" id="page-label"></span>
            <button class="btn btn-sm" id="next-btn" onclick="page++;loadActivity()">Next</button>
        </div>
    </div>
</div>
{% endblock %}
{% block scripts %}
<script>
    if (!POOL.requireAuth()) throw new Error('Not authenticated');

    let page = 1;
    const PER_PAGE = 25;

    async function loadActivity() {
        const kind = document.getElementById('filter-kind').value;
        let url = '/admin/activity?page=' + page + '&per_page=' + PER_PAGE;
        if (kind) url += '&kind=' + encodeURIComponent(kind);

        const resp = await POOL.apiFetch(url);
        if (!resp) return;
        if (!resp.ok) {
            POOL.toast('Failed to load activity: ' + await POOL.errorText(resp), 'error');
            return;
        }
        const body = await resp.json();

        let rows = '';
        for (const e of body.data) {
            const badge = e.outcome === 'success'
                ? '<span class="badge badge-success">success</span>'
                : (e.outcome === 'cancelled'
                    ? '<span class="badge badge-muted">cancelled</span>'
                    : '<span class="badge badge-danger">' + POOL.esc(e.outcome) + '</span>');
            rows += '<tr>' +
                '<td class="mono">' + POOL.timeAgo(e.created_at) + '</td>' +
                '<td>' + POOL.esc(e.kind) + '</td>' +
                '<td class="mono">' + POOL.esc(e.subject) + '</td>' +
                '<td>' + badge + '</td>' +
                '<td class="text-secondary" style="font-size:0.8125rem;">' + POOL.esc(e.detail) + '</td>' +
                '</tr>';
        }
        document.getElementById('activity-table').innerHTML =
            rows || '<tr><td colspan="5" class="text-muted">No activity yet</td></tr>';

        const pages = Math.max(1, Math.ceil(body.total / PER_PAGE));
        document.getElementById('page-label').textContent = 'Page ' + body.page + ' of ' + pages;
        document.getElementById('prev-btn').disabled = body.page <= 1;
        document.getElementById('next-btn').disabled = body.page >= pages;
    }

    loadActivity();
    setInterval(loadActivity, 30000);
</script>
{% endblock %}"#;
