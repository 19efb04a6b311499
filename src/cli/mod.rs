use colored::Colorize;
use macros_rs::{crashln, string};
use procsnap::{
    config::{self, structs::Config},
    helpers::{self, or_dash},
    Process, ProcessReader,
};
use tabled::{
    settings::{
        object::{Columns, Rows},
        style::{BorderColor, Style},
        themes::Colorization,
        Color, Modify, Rotate, Width,
    },
    Table, Tabled,
};

#[derive(Tabled, Debug)]
struct ProcessItem {
    pid: i32,
    ppid: i32,
    user: String,
    uid: String,
    #[tabled(rename = "s")]
    state: String,
    pgrp: String,
    sid: String,
    name: String,
}

impl From<&Process> for ProcessItem {
    fn from(process: &Process) -> Self {
        ProcessItem {
            pid: process.pid(),
            ppid: process.ppid(),
            user: process.user().to_string(),
            uid: or_dash(process.uid()),
            state: or_dash(process.state()),
            pgrp: or_dash(process.pgrp()),
            sid: or_dash(process.sid()),
            name: process.executable().to_string(),
        }
    }
}

// fields are listed in reverse so the rotated table reads top to bottom
#[derive(Tabled, Debug)]
struct Info {
    #[tabled(rename = "session")]
    sid: String,
    #[tabled(rename = "process group")]
    pgrp: String,
    state: String,
    uid: String,
    user: String,
    #[tabled(rename = "parent pid")]
    ppid: i32,
    pid: i32,
    name: String,
}

impl From<&Process> for Info {
    fn from(process: &Process) -> Self {
        Info {
            sid: or_dash(process.sid()),
            pgrp: or_dash(process.pgrp()),
            state: or_dash(process.state()),
            uid: or_dash(process.uid()),
            user: process.user().to_string(),
            ppid: process.ppid(),
            pid: process.pid(),
            name: process.executable().to_string(),
        }
    }
}

fn load_config() -> Config {
    match config::read() {
        Ok(config) => config,
        Err(err) => crashln!("{} {}", *helpers::FAIL, string!(err).white()),
    }
}

fn output_format(format: &Option<String>, config: &Config) -> String {
    match format {
        Some(format) => format.clone(),
        None => config.display.format.clone(),
    }
}

pub fn list(format: &Option<String>) {
    let config = load_config();
    let accounts = config.accounts();
    let format = output_format(format, &config);

    let mut processes = match config.reader(&accounts).processes() {
        Ok(processes) => processes,
        Err(err) => crashln!("{} Cannot read process table.\n{}", *helpers::FAIL, string!(err).white()),
    };
    processes.sort_by_key(|process| process.pid());
    log::debug!("read {} processes", processes.len());

    if processes.is_empty() {
        println!("{} Process table empty", *helpers::WARN);
        return;
    }

    match format.as_str() {
        "raw" => println!("{:?}", processes),
        "json" => match serde_json::to_string(&processes) {
            Ok(json) => println!("{json}"),
            Err(err) => crashln!("{} Cannot serialize process table.\n{}", *helpers::FAIL, string!(err).white()),
        },
        "default" => {
            let items: Vec<ProcessItem> = processes.iter().map(ProcessItem::from).collect();
            let table = Table::new(&items)
                .with(Style::rounded().remove_verticals())
                .with(BorderColor::filled(Color::FG_BRIGHT_BLACK))
                .with(Colorization::exact([Color::FG_BRIGHT_CYAN], Rows::first()))
                .with(Modify::new(Columns::last()).with(Width::truncate(35).suffix("...")))
                .to_string();

            println!("{table}");
        }
        other => crashln!("{} Unknown format '{other}'", *helpers::FAIL),
    }
}

pub fn find(pid: i32, format: &Option<String>) {
    let config = load_config();
    let accounts = config.accounts();
    let format = output_format(format, &config);

    let process = match config.reader(&accounts).find(pid) {
        Ok(Some(process)) => process,
        Ok(None) => crashln!("{} Process ({pid}) not found", *helpers::FAIL),
        Err(err) => crashln!("{} Cannot read process ({pid}).\n{}", *helpers::FAIL, string!(err).white()),
    };

    match format.as_str() {
        "raw" => println!("{:?}", process),
        "json" => match serde_json::to_string(&process) {
            Ok(json) => println!("{json}"),
            Err(err) => crashln!("{} Cannot serialize process.\n{}", *helpers::FAIL, string!(err).white()),
        },
        "default" => {
            let table = Table::new([Info::from(&process)])
                .with(Rotate::Left)
                .with(Style::rounded().remove_horizontals())
                .with(Colorization::exact([Color::FG_CYAN], Columns::first()))
                .with(BorderColor::filled(Color::FG_BRIGHT_BLACK))
                .to_string();

            println!("{}\n{table}\n", format!("Describing process ({pid})").on_bright_white().black());
        }
        other => crashln!("{} Unknown format '{other}'", *helpers::FAIL),
    }
}
