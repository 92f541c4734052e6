use crate::favorites::{FormField, FormOptions};
use crate::format::{capitalize, format_optional_timestamp};
use crate::models::{BathroomLogEntry, Favorite, FoodLogEntry};
use crate::timeline::TimelineItem;
use crate::tracker::Snapshot;

pub fn render_index(
    snapshot: &Snapshot,
    timeline: &[TimelineItem],
    food_types: &[String],
    options: &FormOptions,
    backend: &str,
) -> String {
    fill_template(INDEX_HTML, |key| match key {
        "BACKEND" => Some(escape_html(backend)),
        "FOOD_TYPES" => Some(render_food_types(food_types)),
        "FAVORITES" => Some(render_favorites(&snapshot.favorites)),
        "BATHROOM_CHOICES" => Some(render_bathroom_choices(options)),
        "FOOD_LOGS" => Some(render_list(&snapshot.food_logs, render_food_entry)),
        "BATHROOM_LOGS" => Some(render_list(&snapshot.bathroom_logs, render_bathroom_entry)),
        "TIMELINE" => Some(render_list(timeline, render_timeline_entry)),
        _ => None,
    })
}

/// Replaces each `{{KEY}}` in `template` in a single pass. Substituted text
/// is never scanned again, and unknown keys are left as they are.
fn fill_template(template: &str, value: impl Fn(&str) -> Option<String>) -> String {
    let mut page = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        page.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            page.push_str(&rest[start..]);
            return page;
        };
        match value(&after[..end]) {
            Some(text) => page.push_str(&text),
            None => page.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }
    page.push_str(rest);
    page
}

fn render_list<T>(items: &[T], render: fn(&T) -> String) -> String {
    if items.is_empty() {
        return r#"<p class="empty">Nothing logged yet.</p>"#.to_string();
    }
    items.iter().map(render).collect()
}

fn render_food_types(food_types: &[String]) -> String {
    food_types
        .iter()
        .map(|food_type| format!(r#"<option value="{}">"#, escape_html(food_type)))
        .collect()
}

fn render_favorites(favorites: &[Favorite]) -> String {
    favorites
        .iter()
        .filter_map(|favorite| {
            let id = favorite.id.as_ref()?;
            Some(format!(
                r#"<button type="button" class="favorite-btn" data-id="{}">&#9733; {}</button>"#,
                escape_html(id.as_str()),
                escape_html(favorite.display_label())
            ))
        })
        .collect()
}

fn render_bathroom_choices(options: &FormOptions) -> String {
    FormField::ALL
        .into_iter()
        .map(|field| {
            let name = field_name(field);
            let radios: String = options
                .options_for(field)
                .iter()
                .map(|option| {
                    format!(
                        r#"<label><input type="radio" name="{name}" value="{value}" required> {label}</label>"#,
                        value = escape_html(option),
                        label = escape_html(&capitalize(Some(option))),
                    )
                })
                .collect();
            format!(
                r#"<div class="form-group"><span class="label">{}</span><div class="radio-group">{radios}</div></div>"#,
                capitalize(Some(name))
            )
        })
        .collect()
}

fn field_name(field: FormField) -> &'static str {
    match field {
        FormField::Type => "type",
        FormField::Location => "location",
        FormField::Size => "size",
        FormField::Consistency => "consistency",
    }
}

fn render_food_entry(entry: &FoodLogEntry) -> String {
    let stolen = if entry.stolen {
        r#"<span class="stolen-badge">Stolen!</span>"#
    } else {
        ""
    };
    let location = entry
        .location
        .as_deref()
        .map(|location| {
            format!(
                "<div><small>Location: {}</small></div>",
                escape_html(&capitalize(Some(location)))
            )
        })
        .unwrap_or_default();

    format!(
        r#"<div class="log-entry"><div><strong>Food: {} - {}</strong>{stolen}{location}</div><div>{}</div></div>"#,
        escape_html(&capitalize(Some(&entry.food_type))),
        escape_html(&capitalize(Some(&entry.quantity))),
        format_optional_timestamp(entry.timestamp),
    )
}

fn render_bathroom_entry(entry: &BathroomLogEntry) -> String {
    format!(
        r#"<div class="log-entry"><div><strong>Bathroom: {} - {} - {} - {}</strong></div><div>{}</div></div>"#,
        capitalize(Some(entry.kind.as_str())),
        escape_html(&capitalize(Some(&entry.location))),
        capitalize(Some(entry.size.as_str())),
        capitalize(Some(entry.consistency.as_str())),
        format_optional_timestamp(entry.timestamp),
    )
}

fn render_timeline_entry(item: &TimelineItem) -> String {
    let record = serde_json::to_string(item).unwrap_or_default();
    let edit = match item.id() {
        Some(id) => format!(
            r#"<button type="button" class="btn-edit" data-id="{}" data-record="{}">Edit</button>"#,
            escape_html(id.as_str()),
            escape_html(&record)
        ),
        None => String::new(),
    };

    format!(
        r#"<div class="timeline-entry {kind}"><div class="timeline-content"><div>{summary}</div><div>{time}</div></div>{edit}</div>"#,
        kind = item.kind().as_str(),
        summary = escape_html(&item.summary()),
        time = format_optional_timestamp(item.timestamp()),
    )
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
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

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Molly's Tracker</title>
  <style>
    :root {
      --bg: #f6f1e9;
      --ink: #2b2a28;
      --accent: #d97745;
      --accent-2: #2f4858;
      --card: #ffffff;
      --shadow: 0 16px 40px rgba(47, 72, 88, 0.14);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 24px 16px 48px;
    }

    .app {
      width: min(960px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    .card {
      background: var(--card);
      border-radius: 20px;
      box-shadow: var(--shadow);
      padding: 24px;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(280px, 1fr));
      gap: 24px;
    }

    h1, h2 {
      margin: 0 0 12px;
    }

    .subtitle {
      margin: 0;
      color: #6b645d;
    }

    .form-group {
      display: grid;
      gap: 6px;
      margin-bottom: 12px;
    }

    .radio-group {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
    }

    .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #8b857d;
    }

    input[type="text"] {
      padding: 10px 12px;
      border-radius: 10px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      font-size: 1rem;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 10px 16px;
      font-size: 0.95rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent-2);
      color: white;
    }

    button.primary {
      background: var(--accent);
    }

    .favorite-btn {
      background: #f3e3d3;
      color: var(--ink);
      margin: 0 6px 6px 0;
    }

    .log-entry, .timeline-entry {
      display: flex;
      justify-content: space-between;
      align-items: center;
      gap: 12px;
      padding: 10px 0;
      border-bottom: 1px solid rgba(47, 72, 88, 0.08);
    }

    .timeline-entry.food {
      border-left: 4px solid var(--accent);
      padding-left: 10px;
    }

    .timeline-entry.bathroom {
      border-left: 4px solid var(--accent-2);
      padding-left: 10px;
    }

    .stolen-badge {
      margin-left: 8px;
      padding: 2px 8px;
      border-radius: 999px;
      background: #c0392b;
      color: white;
      font-size: 0.75rem;
    }

    .empty {
      color: #8b857d;
    }

    .modal {
      display: none;
      position: fixed;
      inset: 0;
      background: rgba(0, 0, 0, 0.4);
      padding: 40px 16px;
    }

    .modal .card {
      width: min(520px, 100%);
      margin: 0 auto;
    }

    .row {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
      align-items: center;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Molly's Tracker</h1>
      <p class="subtitle">Meals, bathroom breaks and everything in between. Storage: {{BACKEND}}.</p>
    </header>

    <section class="grid">
      <form id="food-form" class="card">
        <h2>Food</h2>
        <div class="form-group">
          <label class="label" for="food-type">Food type</label>
          <input type="text" id="food-type" list="food-types" required>
          <datalist id="food-types">{{FOOD_TYPES}}</datalist>
        </div>
        <div class="form-group">
          <label class="label" for="food-quantity">Quantity</label>
          <input type="text" id="food-quantity" required>
        </div>
        <div class="form-group">
          <label><input type="checkbox" id="food-stolen"> Stolen food</label>
        </div>
        <div class="form-group">
          <label class="label" for="food-location">Location</label>
          <div class="row">
            <input type="text" id="food-location">
            <button type="button" class="use-location" data-target="food-location">Use my location</button>
          </div>
        </div>
        <button type="submit" class="primary">Log food</button>
      </form>

      <form id="bathroom-form" class="card">
        <h2>Bathroom</h2>
        <div class="row" id="favorites-list">{{FAVORITES}}</div>
        <button type="button" id="edit-favorites-btn">Edit favorites</button>
        {{BATHROOM_CHOICES}}
        <div class="form-group">
          <label class="label" for="bathroom-location">Exact location</label>
          <div class="row">
            <input type="text" id="bathroom-location">
            <button type="button" class="use-location" data-target="bathroom-location">Use my location</button>
          </div>
        </div>
        <button type="submit" class="primary">Log bathroom break</button>
      </form>
    </section>

    <section class="card">
      <h2>Timeline</h2>
      <div id="timeline">{{TIMELINE}}</div>
    </section>

    <section class="grid">
      <div class="card">
        <h2>Food log</h2>
        <div id="food-logs">{{FOOD_LOGS}}</div>
      </div>
      <div class="card">
        <h2>Bathroom log</h2>
        <div id="bathroom-logs">{{BATHROOM_LOGS}}</div>
      </div>
    </section>

    <section class="card row">
      <select id="export-format">
        <option value="csv">CSV</option>
        <option value="json">JSON</option>
      </select>
      <button type="button" id="export-btn">Export</button>
      <label class="label" for="import-file">Import</label>
      <input type="file" id="import-file" accept=".json,.csv">
    </section>
  </main>

  <div class="modal" id="edit-modal">
    <form class="card" id="edit-form">
      <h2>Edit entry</h2>
      <div id="edit-fields"></div>
      <div class="row">
        <button type="submit" class="primary">Save</button>
        <button type="button" id="delete-entry">Delete</button>
        <button type="button" class="close-modal">Cancel</button>
      </div>
    </form>
  </div>

  <div class="modal" id="favorites-modal">
    <form class="card" id="favorites-form">
      <h2>Favorites</h2>
      <div id="favorites-fields"></div>
      <div class="row">
        <button type="button" id="add-favorite-btn">Add favorite</button>
        <button type="submit" class="primary">Save</button>
        <button type="button" class="close-modal">Cancel</button>
      </div>
    </form>
  </div>

  <script>
    const editModal = document.getElementById('edit-modal');
    const editForm = document.getElementById('edit-form');
    const editFields = document.getElementById('edit-fields');
    const favoritesModal = document.getElementById('favorites-modal');
    const favoritesFields = document.getElementById('favorites-fields');
    let editing = null;

    const api = async (method, url, body) => {
      const res = await fetch(url, {
        method,
        headers: body === undefined ? {} : { 'content-type': 'application/json' },
        body: body === undefined ? undefined : JSON.stringify(body)
      });
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      return res;
    };

    const run = (task) => task.then(() => window.location.reload()).catch((err) => alert(err.message));
    const value = (id) => document.getElementById(id).value;
    const checked = (form, name) => {
      const input = form.querySelector(`input[name="${name}"]:checked`);
      return input ? input.value : null;
    };

    document.getElementById('food-form').addEventListener('submit', (event) => {
      event.preventDefault();
      run(api('POST', '/api/food', {
        type: value('food-type'),
        quantity: value('food-quantity'),
        stolen: document.getElementById('food-stolen').checked,
        location: value('food-location')
      }));
    });

    const bathroomForm = document.getElementById('bathroom-form');
    bathroomForm.addEventListener('submit', (event) => {
      event.preventDefault();
      run(api('POST', '/api/bathroom', {
        type: checked(bathroomForm, 'type'),
        location: value('bathroom-location') || checked(bathroomForm, 'location') || '',
        size: checked(bathroomForm, 'size'),
        consistency: checked(bathroomForm, 'consistency')
      }));
    });

    document.querySelectorAll('.use-location').forEach((button) => {
      button.addEventListener('click', () => {
        const input = document.getElementById(button.dataset.target);
        if (!navigator.geolocation) {
          alert('Geolocation is not supported by your browser.');
          return;
        }
        input.value = 'Getting location...';
        navigator.geolocation.getCurrentPosition(
          (position) => {
            const { latitude, longitude } = position.coords;
            input.value = `${latitude.toFixed(5)}, ${longitude.toFixed(5)}`;
          },
          () => {
            input.value = '';
            alert('Unable to retrieve your location.');
          }
        );
      });
    });

    document.querySelectorAll('.favorite-btn').forEach((button) => {
      button.addEventListener('click', async () => {
        try {
          const res = await api('GET', `/api/favorites/${encodeURIComponent(button.dataset.id)}/autofill`);
          for (const selection of await res.json()) {
            const input = bathroomForm.querySelector(
              `input[name="${selection.field}"][value="${selection.value}"]`
            );
            if (input) {
              input.checked = true;
            }
          }
        } catch (err) {
          alert(err.message);
        }
      });
    });

    const radios = (name, choices, current) => choices
      .map((choice) => `<label><input type="radio" name="${name}" value="${choice}" ${choice === current ? 'checked' : ''} required> ${choice}</label>`)
      .join(' ');

    document.querySelectorAll('.btn-edit').forEach((button) => {
      button.addEventListener('click', () => {
        const record = JSON.parse(button.dataset.record);
        editing = { id: button.dataset.id, kind: record.logType };
        if (record.logType === 'food') {
          editFields.innerHTML = `
            <div class="form-group"><span class="label">Food type</span><input type="text" id="edit-food-type" required></div>
            <div class="form-group"><span class="label">Quantity</span><input type="text" id="edit-food-quantity" required></div>
            <div class="form-group"><label><input type="checkbox" id="edit-food-stolen"> Stolen food</label></div>
            <div class="form-group"><span class="label">Location</span><input type="text" id="edit-food-location"></div>`;
          document.getElementById('edit-food-type').value = record.type;
          document.getElementById('edit-food-quantity').value = record.quantity;
          document.getElementById('edit-food-stolen').checked = Boolean(record.stolen);
          document.getElementById('edit-food-location').value = record.location || '';
        } else {
          editFields.innerHTML = `
            <div class="form-group"><span class="label">Location</span><input type="text" id="edit-bathroom-location"></div>
            <div class="form-group"><span class="label">Type</span><div class="radio-group">${radios('edit-type', ['pee', 'poop'], record.type)}</div></div>
            <div class="form-group"><span class="label">Size</span><div class="radio-group">${radios('edit-size', ['big', 'small'], record.size)}</div></div>
            <div class="form-group"><span class="label">Consistency</span><div class="radio-group">${radios('edit-consistency', ['normal', 'soft', 'sick'], record.consistency)}</div></div>`;
          document.getElementById('edit-bathroom-location').value = record.location || '';
        }
        editModal.style.display = 'block';
      });
    });

    editForm.addEventListener('submit', (event) => {
      event.preventDefault();
      const url = `/api/${editing.kind}/${encodeURIComponent(editing.id)}`;
      if (editing.kind === 'food') {
        run(api('PUT', url, {
          type: value('edit-food-type'),
          quantity: value('edit-food-quantity'),
          stolen: document.getElementById('edit-food-stolen').checked,
          location: value('edit-food-location')
        }));
      } else {
        run(api('PUT', url, {
          type: checked(editForm, 'edit-type'),
          location: value('edit-bathroom-location'),
          size: checked(editForm, 'edit-size'),
          consistency: checked(editForm, 'edit-consistency')
        }));
      }
    });

    document.getElementById('delete-entry').addEventListener('click', () => {
      run(api('DELETE', `/api/${editing.kind}/${encodeURIComponent(editing.id)}`));
    });

    document.querySelectorAll('.close-modal').forEach((button) => {
      button.addEventListener('click', () => {
        editModal.style.display = 'none';
        favoritesModal.style.display = 'none';
      });
    });

    const addFavoriteField = (favorite) => {
      const field = document.createElement('div');
      field.className = 'row favorite-field';
      field.innerHTML = `<input type="text" placeholder="Favorite name" required><button type="button" class="remove-favorite">Remove</button>`;
      field.querySelector('input').value = favorite ? favorite.name : '';
      field.dataset.favorite = JSON.stringify(favorite || {});
      favoritesFields.appendChild(field);
    };

    document.getElementById('edit-favorites-btn').addEventListener('click', async () => {
      try {
        const res = await api('GET', '/api/favorites');
        favoritesFields.innerHTML = '';
        (await res.json()).forEach(addFavoriteField);
        favoritesModal.style.display = 'block';
      } catch (err) {
        alert(err.message);
      }
    });

    document.getElementById('add-favorite-btn').addEventListener('click', () => addFavoriteField(null));

    favoritesFields.addEventListener('click', (event) => {
      if (event.target.closest('.remove-favorite')) {
        event.target.closest('.favorite-field').remove();
      }
    });

    document.getElementById('favorites-form').addEventListener('submit', (event) => {
      event.preventDefault();
      const favorites = Array.from(favoritesFields.querySelectorAll('.favorite-field')).map((field) => {
        const previous = JSON.parse(field.dataset.favorite);
        const name = field.querySelector('input').value.trim();
        const renamed = previous.name !== name;
        return { ...previous, name, label: renamed ? name : (previous.label || name) };
      });
      run(api('PUT', '/api/favorites', favorites));
    });

    document.getElementById('export-btn').addEventListener('click', () => {
      window.location.href = `/api/export?format=${value('export-format')}`;
    });

    document.getElementById('import-file').addEventListener('change', async (event) => {
      const file = event.target.files[0];
      if (!file) {
        return;
      }
      try {
        const res = await fetch(`/api/import?file_name=${encodeURIComponent(file.name)}`, {
          method: 'POST',
          body: await file.text()
        });
        if (!res.ok) {
          throw new Error(await res.text());
        }
        alert((await res.json()).message);
        window.location.reload();
      } catch (err) {
        alert('Failed to import logs: ' + err.message);
      }
    });
  </script>
</body>
</html>
"#;
