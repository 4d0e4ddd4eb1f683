use collegium_cli::admin::{self, NewAdminAccount};
use collegium_cli::seeder::{self, SeedConfig};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;

#[derive(Parser)]
#[command(name = "collegium-cli")]
#[command(about = "Collegium CLI - Administrative tools for Collegium", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Make sure an active branch exists (creates "General Studies" if needed)
    EnsureDefaultBranch,
    /// Create an administrator account
    CreateAdmin {
        /// Full name of the admin
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,

        /// Department (defaults to "Administration")
        #[arg(short = 'd', long)]
        department: Option<String>,

        /// Mark the admin as a super admin
        #[arg(long, default_value_t = false)]
        super_admin: bool,
    },
    /// Seed the database with fake branches, courses, faculty, and students
    Seed {
        /// Number of branches to create
        #[arg(short = 'b', long, default_value = "4")]
        branches: usize,

        /// Number of courses per branch
        #[arg(long, default_value = "8")]
        courses: usize,

        /// Number of faculty per branch
        #[arg(long, default_value = "4")]
        faculty: usize,

        /// Number of students per branch
        #[arg(long, default_value = "40")]
        students: usize,
    },
    /// Clear all seeded data (real accounts are kept)
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let pool = collegium_db::init_db_pool()
        .await
        .expect("Failed to connect to database");

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate => handle_migrate(&pool).await,
        Commands::EnsureDefaultBranch => handle_ensure_default_branch(&pool).await,
        Commands::CreateAdmin {
            name,
            email,
            password,
            department,
            super_admin,
        } => handle_create_admin(&pool, name, email, password, department, super_admin).await,
        Commands::Seed {
            branches,
            courses,
            faculty,
            students,
        } => handle_seed(&pool, branches, courses, faculty, students).await,
        Commands::ClearSeed => handle_clear_seed(&pool).await,
    }
}

async fn handle_migrate(pool: &sqlx::postgres::PgPool) {
    match collegium_db::run_migrations(pool).await {
        Ok(_) => println!("✅ Migrations applied"),
        Err(e) => {
            eprintln!("\n❌ Error running migrations: {}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_ensure_default_branch(pool: &sqlx::postgres::PgPool) {
    match collegium_db::ensure_default_branch(pool).await {
        Ok(id) => println!("✅ Active branch available: {}", id),
        Err(e) => {
            eprintln!("\n❌ Error ensuring default branch: {}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_create_admin(
    pool: &sqlx::postgres::PgPool,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    department: Option<String>,
    super_admin: bool,
) {
    let name = name.unwrap_or_else(|| {
        Input::new()
            .with_prompt("Full name")
            .interact_text()
            .expect("Failed to read name")
    });

    let email = email.unwrap_or_else(|| {
        Input::new()
            .with_prompt("Email address")
            .interact_text()
            .expect("Failed to read email")
    });

    let password = password.unwrap_or_else(|| {
        Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
            .expect("Failed to read password")
    });

    if password.len() < 6 {
        eprintln!("\n❌ Password must be at least 6 characters");
        std::process::exit(1);
    }

    let account = NewAdminAccount {
        name: &name,
        email: &email,
        password: &password,
        department: department.as_deref(),
        super_admin,
    };

    match admin::create_admin(pool, account).await {
        Ok(id) => {
            println!("\n✅ Admin created successfully!");
            println!("   Id: {}", id);
            println!("   Email: {}", email.trim().to_lowercase());
            println!("   Name: {}", name);
        }
        Err(e) => {
            eprintln!("\n❌ Error creating admin: {}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_seed(
    pool: &sqlx::postgres::PgPool,
    branches: usize,
    courses: usize,
    faculty: usize,
    students: usize,
) {
    let config = SeedConfig::new(branches)
        .with_courses(courses)
        .with_faculty(faculty)
        .with_students(students);

    if let Err(e) = seeder::seed_all(pool, config).await {
        eprintln!("\n❌ Error seeding database: {}", e);
        std::process::exit(1);
    }
}

async fn handle_clear_seed(pool: &sqlx::postgres::PgPool) {
    if let Err(e) = seeder::clear_all(pool).await {
        eprintln!("\n❌ Error clearing seeded data: {}", e);
        std::process::exit(1);
    }
}
