use chrono::{Local, NaiveDate};
use site_schedule::{
    EventType, InMemoryScheduleStore, Item, ItemId, ItemKind, ItemStatus, LinkedItemRef,
    MilestoneDraft, MilestoneEditor, MilestoneId, PermissionSnapshot, ProjectId, ProjectSchedule,
    ScheduleBackend, ScheduleError, ShowAll, ToastLevel, VisibilityLevel, load_schedule_from_json,
    save_schedule_to_json,
};
use std::io::{self, Write};
use std::str::FromStr;

const CLI_USER: &str = "cli";

fn parse_id_list(s: &str) -> Vec<ItemId> {
    s.split(',')
        .filter_map(|p| p.trim().parse::<ItemId>().ok())
        .collect()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Width in characters, not bytes.
fn display_width(s: &str) -> usize {
    s.chars().count()
}

fn push_row(out: &mut String, cells: &[&str], widths: &[usize]) {
    out.push('|');
    for (cell, width) in cells.iter().zip(widths) {
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(width.saturating_sub(display_width(cell))));
        out.push_str(" |");
    }
    out.push('\n');
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            let width = display_width(cell);
            if width > widths[ci] {
                widths[ci] = width;
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }
    sep.push('\n');

    let mut out = sep.clone();
    push_row(&mut out, headers, &widths);
    out.push_str(&sep);
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        push_row(&mut out, &cells, &widths);
    }
    out.push_str(&sep);
    out
}

fn render_schedule(schedule: &ProjectSchedule) -> String {
    let rows: Vec<Vec<String>> = schedule
        .milestones()
        .iter()
        .map(|m| {
            let progress = m.progress();
            vec![
                m.id.to_string(),
                m.title.clone(),
                m.event_type.to_string(),
                m.start_date.to_string(),
                m.end_date.map(|d| d.to_string()).unwrap_or_default(),
                m.status.to_string(),
                m.linked_items.len().to_string(),
                format!("{progress}%"),
                site_schedule::progress_color(f64::from(progress)).to_string(),
            ]
        })
        .collect();
    render_table(
        &[
            "id", "title", "type", "start", "end", "status", "linked", "progress", "color",
        ],
        &rows,
    )
}

fn render_items(items: &[Item]) -> String {
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            vec![
                item.id.to_string(),
                item.kind.to_string(),
                item.title.clone(),
                item.status.to_string(),
                item.priority.to_string(),
            ]
        })
        .collect();
    render_table(&["id", "type", "title", "status", "priority"], &rows)
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show milestones with progress and schedule status\n  status                             Print the one-line schedule summary\n  today <YYYY-MM-DD>                 Evaluate the schedule as of this date\n  meta show                          Show project metadata\n  meta name <text...>                Update project name\n  meta target <YYYY-MM-DD|none>      Set or clear the target end date\n  item add <id> <task|defect> <title...>\n                                     Add a task or defect\n  item status <id> <status>          Set item status (todo, in_progress, done, resolved, ...)\n  items                              List tasks and defects\n  add <YYYY-MM-DD> <title...>        Create a milestone\n  rename <id> <title...>             Change a milestone title\n  type <id> <milestone|deadline|phase>\n                                     Change the event type\n  end <id> <YYYY-MM-DD|none>         Set or clear the end date\n  link <id> <item_csv|->             Replace linked items (e.g. 3,4 or - for none)\n  toggle <id>                        Flip completed/scheduled\n  delete <id>                        Delete a milestone (asks for confirmation)\n  visibility <id> <public|team|management>\n                                     Set visibility override\n  save json <path>                   Write the project snapshot\n  load json <path>                   Replace the project from a snapshot\n  quit|exit                          Exit"
    );
}

struct Session {
    store: InMemoryScheduleStore,
    project_id: ProjectId,
    today: NaiveDate,
}

impl Session {
    /// Runs one editor action and prints its toasts.
    fn with_editor<T, F>(&self, action: F) -> Option<T>
    where
        F: FnOnce(&mut MilestoneEditor<'_, InMemoryScheduleStore>) -> Result<T, ScheduleError>,
    {
        let mut editor = match MilestoneEditor::open(
            &self.store,
            self.project_id,
            CLI_USER,
            PermissionSnapshot::full(),
        ) {
            Ok(editor) => editor,
            Err(err) => {
                println!("Error: {}", err);
                return None;
            }
        };
        let result = action(&mut editor);
        for toast in editor.take_toasts() {
            match toast.level {
                ToastLevel::Success => println!("{}", toast.message),
                ToastLevel::Error => println!("Error: {}", toast.message),
            }
        }
        result.ok()
    }

    fn edit<F>(&self, milestone_id: MilestoneId, mutate: F)
    where
        F: FnOnce(&mut MilestoneDraft),
    {
        self.with_editor(|editor| {
            editor.select(milestone_id)?;
            editor.begin_edit()?;
            mutate(editor.draft_mut()?);
            editor.save()
        });
    }

    fn schedule(&self) -> Option<ProjectSchedule> {
        match ProjectSchedule::load(&self.store, self.project_id, &ShowAll) {
            Ok(schedule) => Some(schedule),
            Err(err) => {
                println!("Error: {}", err);
                None
            }
        }
    }

    fn print_schedule(&self) {
        if let Some(schedule) = self.schedule() {
            println!("{}", render_schedule(&schedule));
            println!("{}", schedule.summary(self.today).to_cli_summary());
        }
    }

    fn print_metadata(&self) {
        let metadata = self.metadata();
        println!("Project name       : {}", metadata.project_name);
        println!("Project description: {}", metadata.project_description);
        println!(
            "Target end date    : {}",
            metadata
                .target_end_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
    }

    fn metadata(&self) -> site_schedule::ProjectMetadata {
        self.store
            .load_project(self.project_id)
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    fn update_metadata<F>(&self, mutate: F)
    where
        F: FnOnce(&mut site_schedule::ProjectMetadata),
    {
        let mut metadata = self.metadata();
        mutate(&mut metadata);
        match self.store.save_project(self.project_id, &metadata) {
            Ok(()) => println!("Project metadata updated."),
            Err(err) => println!("Error: {}", err),
        }
    }
}

fn main() {
    site_schedule::config::init_tracing(false, "warn");

    let mut session = Session {
        store: InMemoryScheduleStore::new(),
        project_id: 1,
        today: Local::now().date_naive(),
    };

    println!("Site Schedule (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim().to_string();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let Some(cmd) = parts.next() else {
            continue;
        };
        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => session.print_schedule(),
            "status" => {
                if let Some(schedule) = session.schedule() {
                    println!("{}", schedule.summary(session.today).to_cli_summary());
                }
            }
            "today" => match parts.next().and_then(parse_date) {
                Some(date) => {
                    session.today = date;
                    println!("Evaluating schedule as of {}.", date);
                }
                None => println!("Usage: today <YYYY-MM-DD>"),
            },
            "meta" => match parts.next() {
                Some("show") => session.print_metadata(),
                Some("name") => {
                    let rest: Vec<&str> = parts.collect();
                    if rest.is_empty() {
                        println!("Usage: meta name <text...>");
                    } else {
                        let name = rest.join(" ");
                        session.update_metadata(|m| m.project_name = name);
                    }
                }
                Some("target") => match parts.next() {
                    Some("none") => session.update_metadata(|m| m.target_end_date = None),
                    Some(value) => match parse_date(value) {
                        Some(date) => session.update_metadata(|m| m.target_end_date = Some(date)),
                        None => println!("Invalid date (YYYY-MM-DD)"),
                    },
                    None => println!("Usage: meta target <YYYY-MM-DD|none>"),
                },
                _ => println!("Usage: meta <show|name|target> ..."),
            },
            "items" => match session.store.list_items() {
                Ok(items) => println!("{}", render_items(&items)),
                Err(err) => println!("Error: {}", err),
            },
            "item" => match parts.next() {
                Some("add") => {
                    let id = parts.next().and_then(|s| s.parse::<ItemId>().ok());
                    let kind = parts.next().and_then(|s| ItemKind::from_str(s).ok());
                    let title: Vec<&str> = parts.collect();
                    match (id, kind, title.is_empty()) {
                        (Some(id), Some(kind), false) => {
                            session.store.upsert_item(Item::new(id, kind, title.join(" ")));
                            println!("Added {} {}.", kind, id);
                        }
                        _ => println!("Usage: item add <id> <task|defect> <title...>"),
                    }
                }
                Some("status") => {
                    let id = parts.next().and_then(|s| s.parse::<ItemId>().ok());
                    let status = parts.next().and_then(|s| ItemStatus::from_str(s).ok());
                    match (id, status) {
                        (Some(id), Some(status)) => {
                            let existing = session.store.list_items_by_ids(&[id]);
                            match existing.ok().and_then(|items| items.into_iter().next()) {
                                Some(item) => {
                                    session.store.upsert_item(item.with_status(status));
                                    println!("Item {} is now {}.", id, status);
                                }
                                None => println!("Unknown item {}", id),
                            }
                        }
                        _ => println!("Usage: item status <id> <status>"),
                    }
                }
                _ => println!("Usage: item <add|status> ..."),
            },
            "add" => {
                let date = parts.next().and_then(parse_date);
                let title: Vec<&str> = parts.collect();
                match (date, title.is_empty()) {
                    (Some(date), false) => {
                        let title = title.join(" ");
                        let created = session.with_editor(|editor| {
                            editor.begin_create()?;
                            let draft = editor.draft_mut()?;
                            draft.title = title;
                            draft.start_date = Some(date);
                            editor.save()
                        });
                        if let Some(milestone) = created {
                            println!("Created milestone {}.", milestone.id);
                        }
                    }
                    _ => println!("Usage: add <YYYY-MM-DD> <title...>"),
                }
            }
            "rename" => {
                let id = parts.next().and_then(|s| s.parse::<MilestoneId>().ok());
                let title: Vec<&str> = parts.collect();
                match id {
                    Some(id) => {
                        let title = title.join(" ");
                        session.edit(id, |draft| draft.title = title);
                    }
                    None => println!("Usage: rename <id> <title...>"),
                }
            }
            "type" => {
                let id = parts.next().and_then(|s| s.parse::<MilestoneId>().ok());
                let event_type = parts.next().and_then(|s| EventType::from_str(s).ok());
                match (id, event_type) {
                    (Some(id), Some(event_type)) => {
                        session.edit(id, |draft| draft.event_type = event_type)
                    }
                    _ => println!("Usage: type <id> <milestone|deadline|phase>"),
                }
            }
            "end" => {
                let id = parts.next().and_then(|s| s.parse::<MilestoneId>().ok());
                let value = parts.next();
                match (id, value) {
                    (Some(id), Some("none")) => session.edit(id, |draft| draft.end_date = None),
                    (Some(id), Some(value)) => match parse_date(value) {
                        Some(date) => session.edit(id, |draft| draft.end_date = Some(date)),
                        None => println!("Invalid date (YYYY-MM-DD)"),
                    },
                    _ => println!("Usage: end <id> <YYYY-MM-DD|none>"),
                }
            }
            "link" => {
                let id = parts.next().and_then(|s| s.parse::<MilestoneId>().ok());
                let csv = parts.next();
                match (id, csv) {
                    (Some(id), Some(csv)) => {
                        let ids = if csv == "-" {
                            Vec::new()
                        } else {
                            parse_id_list(csv)
                        };
                        let refs: Vec<LinkedItemRef> = match session.store.list_items_by_ids(&ids)
                        {
                            Ok(items) => items.iter().map(LinkedItemRef::from).collect(),
                            Err(err) => {
                                println!("Error: {}", err);
                                continue;
                            }
                        };
                        for missing in ids.iter().filter(|i| !refs.iter().any(|r| r.id == **i)) {
                            println!("Unknown item {} ignored", missing);
                        }
                        session.edit(id, |draft| draft.linked_items = refs);
                    }
                    _ => println!("Usage: link <id> <item_csv|->"),
                }
            }
            "toggle" => match parts.next().and_then(|s| s.parse::<MilestoneId>().ok()) {
                Some(id) => {
                    session.with_editor(|editor| editor.toggle_completion(id));
                }
                None => println!("Usage: toggle <id>"),
            },
            "delete" => match parts.next().and_then(|s| s.parse::<MilestoneId>().ok()) {
                Some(id) => {
                    let deleted = session.with_editor(|editor| {
                        editor.select(id)?;
                        editor.delete(|milestone| {
                            print!("Delete '{}'? [y/N] ", milestone.title);
                            let _ = io::stdout().flush();
                            let mut answer = String::new();
                            if stdin.read_line(&mut answer).is_err() {
                                return false;
                            }
                            matches!(answer.trim(), "y" | "Y" | "yes")
                        })
                    });
                    match deleted {
                        Some(true) => println!("Deleted milestone {}.", id),
                        Some(false) => println!("Delete cancelled."),
                        None => {}
                    }
                }
                None => println!("Usage: delete <id>"),
            },
            "visibility" => {
                let id = parts.next().and_then(|s| s.parse::<MilestoneId>().ok());
                let level = parts.next().and_then(|s| VisibilityLevel::from_str(s).ok());
                match (id, level) {
                    (Some(id), Some(level)) => match session.store.set_visibility(id, level) {
                        Ok(()) => println!("Milestone {} visible to {}.", id, level),
                        Err(err) => println!("Error: {}", err),
                    },
                    _ => println!("Usage: visibility <id> <public|team|management>"),
                }
            }
            "save" | "load" => {
                let fmt = parts.next();
                let path = parts.next();
                match (fmt, path) {
                    (Some("json"), Some(path)) if cmd == "save" => {
                        match save_schedule_to_json(&session.store, session.project_id, path) {
                            Ok(()) => println!("Schedule saved to {}.", path),
                            Err(err) => println!("Error: {}", err),
                        }
                    }
                    (Some("json"), Some(path)) => {
                        let loaded = load_schedule_from_json(path).and_then(|snapshot| {
                            let project_id = snapshot.project_id;
                            snapshot.into_store().map(|store| (project_id, store))
                        });
                        match loaded {
                            Ok((project_id, store)) => {
                                session.store = store;
                                session.project_id = project_id;
                                println!("Schedule loaded from {}.", path);
                            }
                            Err(err) => println!("Error: {}", err),
                        }
                    }
                    _ => println!("Usage: {} json <path>", cmd),
                }
            }
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
