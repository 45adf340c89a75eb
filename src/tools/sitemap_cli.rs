use admitbase_backend::config::Config;
use admitbase_backend::models::db_operations::content_db_operations;
use admitbase_backend::tools::generate;
use chrono::Utc;
use clap::Parser;
use redb::Database;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sitemap_cli", author, version, about = "Generates sitemap.xml and llms.txt from the content database.", long_about = None)]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,

    /// Directory the generated files are written into.
    #[arg(long, default_value = ".", value_name = "DIR")]
    output_dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    let db = match Database::open(config.content_db_path()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!(
                "❌ Error: could not open content database at '{}': {}. Run `setup_cli db setup` first.",
                config.content_db_path().display(),
                e
            );
            return;
        }
    };

    let colleges = match content_db_operations::read_all_colleges(&db) {
        Ok(colleges) => colleges,
        Err(e) => {
            eprintln!("❌ Error reading colleges: {}", e);
            return;
        }
    };

    let blogs = match content_db_operations::read_all_blog_summaries(&db) {
        Ok(blogs) => blogs,
        Err(e) => {
            eprintln!("❌ Error reading blog posts: {}", e);
            return;
        }
    };

    println!(
        "Generating sitemap for {} colleges and {} blog posts...",
        colleges.len(),
        blogs.len()
    );

    let urls = generate::site_urls(&config.public_base_url, &colleges, &blogs);
    let lastmod = Utc::now().format("%Y-%m-%d").to_string();
    let sitemap = generate::build_sitemap_xml(&urls, &lastmod);
    let llms = generate::build_llms_txt(&config.public_base_url, &colleges, &blogs);

    if let Err(e) = fs::create_dir_all(&cli.output_dir) {
        eprintln!("❌ Error creating output directory: {}", e);
        return;
    }

    let sitemap_path = cli.output_dir.join("sitemap.xml");
    match fs::write(&sitemap_path, sitemap) {
        Ok(_) => println!("✅ Wrote {} URLs to '{}'.", urls.len(), sitemap_path.display()),
        Err(e) => eprintln!("❌ Error writing sitemap: {}", e),
    }

    let llms_path = cli.output_dir.join("llms.txt");
    match fs::write(&llms_path, llms) {
        Ok(_) => println!("✅ Wrote '{}'.", llms_path.display()),
        Err(e) => eprintln!("❌ Error writing llms.txt: {}", e),
    }
}
