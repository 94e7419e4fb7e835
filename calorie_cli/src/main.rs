use calorie_core::*;
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kcal")]
#[command(about = "Calorie and BMR tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Sign in with email and password, or through the federated provider
    Login {
        #[arg(long, required_unless_present = "federated")]
        email: Option<String>,

        #[arg(long, required_unless_present = "federated")]
        password: Option<String>,

        /// Use the external identity provider instead of a password
        #[arg(long, conflicts_with_all = ["email", "password"])]
        federated: bool,
    },

    /// Sign out
    Logout,

    /// Show the signed-in account
    Whoami,

    /// View or edit your profile and daily goal
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },

    /// Log, list and remove meals
    Meal {
        #[command(subcommand)]
        command: MealCommand,
    },

    /// Progress towards the daily goal
    Summary {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Export meals in a date range to CSV
    Export {
        #[arg(long)]
        from: NaiveDate,

        #[arg(long)]
        to: NaiveDate,

        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Show the profile with its BMR and daily goal
    Show,

    /// Change profile fields and save
    ///
    /// The daily goal follows the computed TDEE only while it is empty or 0.
    /// Once it holds any other value, later changes leave it alone; pass
    /// `--goal 0` together with a field change to have it recomputed.
    Set {
        /// Weight in kg
        #[arg(long)]
        weight: Option<String>,

        /// Height in cm
        #[arg(long)]
        height: Option<String>,

        /// Age in years
        #[arg(long)]
        age: Option<String>,

        /// male or female
        #[arg(long)]
        gender: Option<Gender>,

        /// sedentary, light, moderate, active or very_active
        #[arg(long)]
        activity: Option<ActivityLevel>,

        /// Daily calorie goal
        #[arg(long)]
        goal: Option<String>,
    },
}

#[derive(Subcommand)]
enum MealCommand {
    /// Log a meal
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        calories: String,

        /// Time (HH:MM), defaults to now
        #[arg(long)]
        time: Option<String>,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Remove a logged meal
    Rm {
        id: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List meals for a date
    List {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

/// Everything a command needs, passed in rather than looked up
struct App {
    config: Config,
    auth: LocalAuth,
    store: LocalStore,
    session: Session,
    notices: NoticeBoard,
}

impl App {
    fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let config = Config::load()?;
        let data_dir = data_dir.unwrap_or_else(|| config.data.data_dir.clone());

        let auth = LocalAuth::open(&data_dir, config.auth.clone())?;
        let store = LocalStore::new(&data_dir);
        let session = Session::resolved(&auth);
        let notices = NoticeBoard::new(chrono::Duration::seconds(config.notices.ttl_seconds));

        Ok(Self {
            config,
            auth,
            store,
            session,
            notices,
        })
    }

    fn user(&self) -> Result<User> {
        self.session.require_user().cloned()
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.show(notice);
        if let Some(notice) = self.notices.visible(Utc::now()) {
            print_notice(notice);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init_with_level(logging::level_for_verbosity(cli.verbose));

    if let Err(err) = run(cli) {
        tracing::debug!("Command failed: {}", err);
        print_notice(&Notice::from_error(&err));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut app = App::open(cli.data_dir)?;

    match cli.command {
        Commands::Register { email, password } => {
            let user = app.auth.register_with_password(&email, &password)?;
            app.session.refresh(&app.auth);
            app.notify(Notice::success(format!(
                "Account created. Signed in as {}",
                display_name(&user)
            )));
            Ok(())
        }
        Commands::Login {
            email,
            password,
            federated,
        } => cmd_login(&mut app, email, password, federated),
        Commands::Logout => {
            app.auth.logout()?;
            app.session.refresh(&app.auth);
            app.notify(Notice::success("Signed out."));
            Ok(())
        }
        Commands::Whoami => {
            match &app.session.user {
                Some(user) => println!("{} ({})", display_name(user), user.uid),
                None => println!("Not signed in."),
            }
            Ok(())
        }
        Commands::Profile { command } => match command {
            ProfileCommand::Show => cmd_profile_show(&mut app),
            ProfileCommand::Set {
                weight,
                height,
                age,
                gender,
                activity,
                goal,
            } => cmd_profile_set(
                &mut app,
                ProfileEdits {
                    weight,
                    height,
                    age,
                    gender,
                    activity,
                    goal,
                },
            ),
        },
        Commands::Meal { command } => match command {
            MealCommand::Add {
                name,
                calories,
                time,
                date,
            } => cmd_meal_add(&mut app, name, calories, time, date),
            MealCommand::Rm { id, date } => cmd_meal_rm(&mut app, id, date),
            MealCommand::List { date } => cmd_meal_list(&mut app, date),
        },
        Commands::Summary { date } => cmd_summary(&mut app, date),
        Commands::Export { from, to, out } => {
            let user = app.user()?;
            let count = export_meals_csv(&app.store, &user, from, to, &out)?;
            app.notify(Notice::success(format!(
                "Exported {} meals to {}",
                count,
                out.display()
            )));
            Ok(())
        }
    }
}

fn cmd_login(
    app: &mut App,
    email: Option<String>,
    password: Option<String>,
    federated: bool,
) -> Result<()> {
    let user = if federated {
        app.auth.login_with_federated_provider()?
    } else {
        match (email, password) {
            (Some(email), Some(password)) => app.auth.login_with_password(&email, &password)?,
            _ => {
                return Err(Error::Validation(
                    "Email and password are required.".into(),
                ))
            }
        }
    };

    app.session.refresh(&app.auth);
    app.notify(Notice::success(format!("Signed in as {}", display_name(&user))));
    Ok(())
}

fn cmd_profile_show(app: &mut App) -> Result<()> {
    let user = app.user()?;
    let cache = LiveCache::new(app.store.subscribe_profile(&user.uid)?);
    let stored = cache.get().and_then(Option::as_ref);

    let editor = ProfileEditor::from_profile(stored, &app.config.profile);
    display_profile(&editor);
    if stored.is_none() {
        println!();
        println!("  (not saved yet - run `kcal profile set` to save)");
    }
    Ok(())
}

struct ProfileEdits {
    weight: Option<String>,
    height: Option<String>,
    age: Option<String>,
    gender: Option<Gender>,
    activity: Option<ActivityLevel>,
    goal: Option<String>,
}

fn cmd_profile_set(app: &mut App, edits: ProfileEdits) -> Result<()> {
    let user = app.user()?;
    let stored = app.store.read_profile(&user.uid)?;
    let mut editor = ProfileEditor::from_profile(stored.as_ref(), &app.config.profile);

    // goal first, so clearing it re-opens auto-fill for the changes below
    if let Some(goal) = &edits.goal {
        editor.set_daily_goal(goal);
    }
    if let Some(weight) = &edits.weight {
        editor.set_weight(weight);
    }
    if let Some(height) = &edits.height {
        editor.set_height(height);
    }
    if let Some(age) = &edits.age {
        editor.set_age(age);
    }
    if let Some(gender) = edits.gender {
        editor.set_gender(gender);
    }
    if let Some(activity) = edits.activity {
        editor.set_activity(activity);
    }

    editor.save(&mut app.store, &user)?;
    display_profile(&editor);
    println!();
    app.notify(Notice::success("Profile saved."));
    Ok(())
}

fn cmd_meal_add(
    app: &mut App,
    name: String,
    calories: String,
    time: Option<String>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let user = app.user()?;

    let mut form = MealForm::now();
    if let Some(date) = date {
        form.set_date(date);
    }
    if let Some(time) = time {
        form.set_time(&time);
    }
    form.set_name(&name);
    form.set_calories(&calories);

    let (entry, notice) = form.submit(&mut app.store, &user)?;
    app.notify(notice);
    println!(
        "  {}  {}  {} kcal  [{}]",
        entry.time.format("%H:%M"),
        entry.name,
        entry.calories,
        entry.id
    );
    Ok(())
}

fn cmd_meal_rm(app: &mut App, id: String, date: Option<NaiveDate>) -> Result<()> {
    let user = app.user()?;

    let mut form = MealForm::now();
    form.set_date(date.unwrap_or_else(today));
    form.remove(&mut app.store, &user, &id)?;

    app.notify(Notice::success("Meal removed."));
    Ok(())
}

fn cmd_meal_list(app: &mut App, date: Option<NaiveDate>) -> Result<()> {
    let user = app.user()?;
    let date = date.unwrap_or_else(today);
    let cache = LiveCache::new(app.store.subscribe_meals(&user.uid, date)?);
    let meals = cache.get().map(Vec::as_slice).unwrap_or_default();

    println!("Meals for {}", date);
    if meals.is_empty() {
        println!("  No meals logged.");
    }
    for meal in meals {
        println!(
            "  {}  {:<24} {:>7} kcal  [{}]",
            meal.time.format("%H:%M"),
            meal.name,
            meal.calories,
            meal.id
        );
    }
    println!("Total: {} kcal", meal_total(meals));
    Ok(())
}

fn cmd_summary(app: &mut App, date: Option<NaiveDate>) -> Result<()> {
    let user = app.user()?;
    let date = date.unwrap_or_else(today);

    let meals = LiveCache::new(app.store.subscribe_meals(&user.uid, date)?);
    let profile = LiveCache::new(app.store.subscribe_profile(&user.uid)?);

    let summary = DailySummary::compute(
        date,
        meals.get().map(Vec::as_slice).unwrap_or_default(),
        profile.get().and_then(Option::as_ref),
    );

    println!("Summary for {}", summary.date);
    println!("  [{}] {}%", progress_bar(summary.progress_pct, 20), summary.progress_pct);
    println!("  Consumed:  {} kcal", summary.consumed);
    println!("  Goal:      {} kcal", summary.goal);
    println!("  Remaining: {} kcal", summary.remaining());
    Ok(())
}

fn display_profile(editor: &ProfileEditor) {
    println!("Profile");
    println!("  Weight:     {} kg", editor.weight());
    println!("  Height:     {} cm", editor.height());
    println!("  Age:        {}", editor.age());
    println!("  Gender:     {}", editor.gender());
    println!("  Activity:   {}", editor.activity());
    println!("  BMR:        {} kcal", editor.bmr());
    println!("  Daily goal: {} kcal", editor.daily_goal());
}

fn display_name(user: &User) -> &str {
    user.email.as_deref().unwrap_or(&user.uid)
}

fn progress_bar(pct: u32, width: usize) -> String {
    let filled = (pct.min(100) as usize * width) / 100;
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_notice(notice: &Notice) {
    match notice.kind {
        NoticeKind::Success => println!("✓ {}", notice.message),
        NoticeKind::Error => eprintln!("✗ {}", notice.message),
    }
}
