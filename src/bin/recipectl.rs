//! recipectl - Keep AI-generated recipes and their recent history
//!
//! This binary imports recipe replies from the generation service, shows the
//! current recipe in the chosen language and manages recent history.

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Arg, ArgAction, ArgMatches, Command};
use rust_i18n::t;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use recipectl::config::Config;
use recipectl::i18n::{init_locale, Language};
use recipectl::logging::init_logging;
use recipectl::recipe::{Diet, Recipe};
use recipectl::reply::{parse_generation_reply, parse_modification_reply};
use recipectl::search::search_recent;
use recipectl::storage::{FileStorage, Storage, CURRENT_LANGUAGE_KEY};
use recipectl::store::RecipeStore;
use recipectl::text::select;
use recipectl::timefmt::{format_duration, format_hours_minutes, minutes, parse_seconds};

rust_i18n::i18n!("locales", fallback = "en");

type Store = RecipeStore<FileStorage>;

fn id_arg() -> Arg {
    Arg::new("id")
        .help(t!("help.recipectl.id").to_string())
        .required(true)
        .index(1)
        .value_parser(clap::value_parser!(i64))
}

fn input_arg() -> Arg {
    Arg::new("input")
        .help(t!("help.recipectl.input").to_string())
        .required(true)
        .index(1)
}

fn build_cli() -> Command {
    Command::new("recipectl")
        .about(t!("help.recipectl.about").to_string())
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .subcommand_required(true)
        .arg(
            Arg::new("data_dir")
                .long("data-dir")
                .short('d')
                .help(t!("help.recipectl.data_dir").to_string())
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true)
        )
        .subcommand(
            Command::new("import")
                .about(t!("help.recipectl.import").to_string())
                .arg(input_arg())
                .arg(
                    Arg::new("diet")
                        .long("diet")
                        .help(t!("help.recipectl.diet").to_string())
                        .value_parser(["veg", "nonveg", "vegan"])
                )
                .arg(
                    Arg::new("cuisine")
                        .long("cuisine")
                        .help(t!("help.recipectl.cuisine").to_string())
                        .value_name("CUISINE")
                )
        )
        .subcommand(
            Command::new("modify")
                .about(t!("help.recipectl.modify").to_string())
                .arg(input_arg())
        )
        .subcommand(
            Command::new("show")
                .about(t!("help.recipectl.show").to_string())
                .arg(
                    Arg::new("lang")
                        .long("lang")
                        .short('l')
                        .help(t!("help.recipectl.show_lang").to_string())
                        .value_name("CODE")
                )
        )
        .subcommand(Command::new("clear").about(t!("help.recipectl.clear").to_string()))
        .subcommand(
            Command::new("recent")
                .about(t!("help.recipectl.recent").to_string())
                .arg(
                    Arg::new("search")
                        .long("search")
                        .short('s')
                        .help(t!("help.recipectl.search").to_string())
                        .value_name("QUERY")
                )
        )
        .subcommand(
            Command::new("open")
                .about(t!("help.recipectl.open").to_string())
                .arg(id_arg())
        )
        .subcommand(
            Command::new("remove")
                .about(t!("help.recipectl.remove").to_string())
                .arg(id_arg())
        )
        .subcommand(
            Command::new("clear-recent")
                .about(t!("help.recipectl.clear_recent").to_string())
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .short('y')
                        .help(t!("help.recipectl.confirm").to_string())
                        .action(ArgAction::SetTrue)
                )
        )
        .subcommand(
            Command::new("lang")
                .about(t!("help.recipectl.lang").to_string())
                .arg(
                    Arg::new("code")
                        .help(t!("help.recipectl.lang_code").to_string())
                        .index(1)
                )
        )
}

fn main() -> Result<()> {
    init_logging();

    // Help text follows the system locale until the stored language is known
    init_locale(None);

    let matches = build_cli().get_matches();

    let config = Config::resolve(matches.get_one::<PathBuf>("data_dir").cloned());
    let storage = FileStorage::new(&config.data_dir);

    let stored_language = storage
        .get(CURRENT_LANGUAGE_KEY)
        .ok()
        .flatten()
        .and_then(|code| Language::from_code(&code));
    init_locale(stored_language);

    let mut store = RecipeStore::open(storage);

    match matches.subcommand() {
        Some(("import", sub)) => import(&mut store, sub),
        Some(("modify", sub)) => modify(&mut store, sub),
        Some(("show", sub)) => show(&mut store, sub),
        Some(("clear", _)) => {
            store.clear_recipe();
            println!("{}", t!("recipectl.recipe_cleared"));
            Ok(())
        }
        Some(("recent", sub)) => recent(&store, sub),
        Some(("open", sub)) => open(&mut store, sub),
        Some(("remove", sub)) => remove(&mut store, sub),
        Some(("clear-recent", sub)) => clear_recent(&mut store, sub),
        Some(("lang", sub)) => lang(&mut store, sub),
        _ => bail!("{}", t!("recipectl.unknown_command")),
    }
}

/// Read the reply document from a file, or stdin for "-"
fn read_input(matches: &ArgMatches) -> Result<String> {
    let input = matches
        .get_one::<String>("input")
        .context(t!("recipectl.missing_input").to_string())?;

    if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context(t!("recipectl.failed_read_stdin").to_string())?;
        return Ok(buf);
    }

    fs::read_to_string(input).context(t!("recipectl.failed_read_input", path = input).to_string())
}

fn import(store: &mut Store, matches: &ArgMatches) -> Result<()> {
    let raw = read_input(matches)?;

    let mut recipe = match parse_generation_reply(&raw) {
        Ok(recipe) => recipe,
        Err(rejection) => bail!("{}", rejection.localized_message()),
    };

    // The reply seldom repeats what was asked for; fill in the request
    if recipe.diet.is_none() {
        if let Some(diet) = matches.get_one::<String>("diet") {
            recipe.diet = Some(diet.parse::<Diet>()?);
        }
    }
    if recipe.cuisine.is_none() {
        recipe.cuisine = matches.get_one::<String>("cuisine").cloned();
    }

    let name = recipe_title(&recipe, store.current_language());
    store.set_recipe(Some(recipe));
    println!("{}", t!("recipectl.recipe_imported", name = name));
    Ok(())
}

fn modify(store: &mut Store, matches: &ArgMatches) -> Result<()> {
    let Some(original) = store.current_recipe().cloned() else {
        bail!("{}", t!("recipectl.no_current_recipe"));
    };

    let raw = read_input(matches)?;
    let recipe = match parse_modification_reply(&raw, &original) {
        Ok(recipe) => recipe,
        Err(rejection) => bail!("{}", rejection.localized_message()),
    };

    store.set_recipe(Some(recipe));
    println!("{}", t!("recipectl.recipe_updated"));
    Ok(())
}

fn show(store: &mut Store, matches: &ArgMatches) -> Result<()> {
    let language = match matches.get_one::<String>("lang") {
        Some(code) => code.parse::<Language>()?,
        None => store.current_language(),
    };

    store.restore_current_recipe();
    let Some(recipe) = store.current_recipe() else {
        println!("{}", t!("recipectl.no_current_recipe"));
        return Ok(());
    };

    println!("{}", recipe_title(recipe, language));
    println!("{}", t!("recipectl.label_total_time", time = format_duration(recipe.total_time.as_deref())));
    if let Some(diet) = recipe.diet {
        println!("{}", t!("recipectl.label_diet", diet = diet));
    }
    if let Some(cuisine) = recipe.cuisine.as_deref() {
        println!("{}", t!("recipectl.label_cuisine", cuisine = cuisine));
    }

    println!("\n{}", t!("recipectl.heading_ingredients"));
    for ingredient in &recipe.ingredients {
        println!("  - {} ({})", ingredient.name.select(language), ingredient.quantity);
    }

    println!("\n{}", t!("recipectl.heading_steps"));
    for step in &recipe.steps {
        match step.active_seconds() {
            Some(secs) => println!(
                "  {}. {} [{}]",
                step.step_number,
                step.instruction.select(language),
                format_duration(Some(&secs.to_string()))
            ),
            None => println!("  {}. {}", step.step_number, step.instruction.select(language)),
        }

        let used: Vec<&str> = recipe
            .ingredients_for_step(step)
            .iter()
            .map(|ing| ing.name.select(language))
            .collect();
        if !used.is_empty() {
            println!("     {}", t!("recipectl.label_uses", names = used.join(", ")));
        }
    }

    Ok(())
}

fn recent(store: &Store, matches: &ArgMatches) -> Result<()> {
    let language = store.current_language();
    let query = matches.get_one::<String>("search").map(String::as_str).unwrap_or("");
    let found = search_recent(store.recent_recipes(), query, language);

    if store.recent_recipes().is_empty() {
        println!("{}", t!("recipectl.no_recent_recipes"));
        return Ok(());
    }

    println!(
        "{}",
        t!("recipectl.recent_count", shown = found.len(), total = store.recent_recipes().len())
    );
    for entry in found {
        println!(
            "{:>14}  {}  {}  {}",
            entry.id,
            recipe_title(&entry.recipe, language),
            t!("recipectl.minutes", count = minutes(entry.recipe.total_time.as_deref())),
            entry.created_at.with_timezone(&Local).format("%d %b %Y %H:%M")
        );
    }

    let cooked: u64 = store
        .recent_recipes()
        .iter()
        .map(|entry| parse_seconds(entry.recipe.total_time.as_deref()))
        .sum();
    println!("{}", t!("recipectl.total_cooking", time = format_hours_minutes(cooked)));
    Ok(())
}

fn open(store: &mut Store, matches: &ArgMatches) -> Result<()> {
    let id = *matches.get_one::<i64>("id").context(t!("recipectl.missing_id").to_string())?;

    let Some(entry) = store.find_recent(id) else {
        bail!("{}", t!("recipectl.recent_not_found", id = id));
    };
    let recipe = entry.recipe.clone();
    let name = recipe_title(&recipe, store.current_language());

    store.set_recipe(Some(recipe));
    println!("{}", t!("recipectl.recipe_opened", name = name));
    Ok(())
}

fn remove(store: &mut Store, matches: &ArgMatches) -> Result<()> {
    let id = *matches.get_one::<i64>("id").context(t!("recipectl.missing_id").to_string())?;

    if store.find_recent(id).is_none() {
        bail!("{}", t!("recipectl.recent_not_found", id = id));
    }
    store.remove_recent_recipe(id);
    println!("{}", t!("recipectl.recent_removed", id = id));
    Ok(())
}

fn clear_recent(store: &mut Store, matches: &ArgMatches) -> Result<()> {
    if !matches.get_flag("yes") {
        bail!("{}", t!("recipectl.confirm_clear_recent"));
    }
    store.clear_all_recent_recipes();
    println!("{}", t!("recipectl.recent_cleared"));
    Ok(())
}

fn lang(store: &mut Store, matches: &ArgMatches) -> Result<()> {
    let Some(code) = matches.get_one::<String>("code") else {
        for language in Language::all() {
            let marker = if *language == store.current_language() { "*" } else { " " };
            println!("{} {}  {}", marker, language.code(), language.display_name());
        }
        return Ok(());
    };

    let language = code.parse::<Language>()?;
    store.set_current_language(language);
    init_locale(Some(language));
    println!("{}", t!("recipectl.language_set", name = language.display_name()));
    Ok(())
}

fn recipe_title(recipe: &Recipe, language: Language) -> String {
    let title = select(recipe.recipe_name.as_ref(), language);
    if title.is_empty() {
        t!("recipectl.untitled").to_string()
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn a_subcommand_is_required() {
        assert!(build_cli().try_get_matches_from(["recipectl"]).is_err());
        let matches = build_cli()
            .try_get_matches_from(["recipectl", "-d", "/tmp/x", "open", "42"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "open");
        assert_eq!(sub.get_one::<i64>("id"), Some(&42));
    }
}
