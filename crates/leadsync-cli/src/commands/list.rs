use std::path::Path;

use leadsync_core::query::{LeadQuery, SortOrder};

use crate::cli::SortArg;
use crate::commands::common::{
    format_lead_lines, lead_to_list_item, open_database, LeadListItem, ProfileContext,
};
use crate::error::CliError;

pub struct ListOptions {
    pub search: Option<String>,
    pub status: Option<String>,
    pub platform: Option<String>,
    pub sort: SortArg,
    pub page: usize,
    pub page_size: usize,
}

impl ListOptions {
    pub fn into_query(self) -> LeadQuery {
        LeadQuery {
            search: self.search,
            status: self.status,
            platform: self.platform,
            sort: match self.sort {
                SortArg::Newest => SortOrder::Newest,
                SortArg::Oldest => SortOrder::Oldest,
                SortArg::Name => SortOrder::Name,
            },
            page: self.page,
            page_size: self.page_size,
        }
    }
}

pub async fn run_list(
    options: ListOptions,
    as_json: bool,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let (scope, _) = context.account()?;
    let db = open_database(db_path, &context.profile).await?;

    let leads = db.list_leads(&scope).await?;
    let page = options.into_query().apply(&leads);

    if as_json {
        let json_items = page
            .leads
            .iter()
            .map(lead_to_list_item)
            .collect::<Vec<LeadListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if page.leads.is_empty() {
        if leads.is_empty() {
            println!("No leads stored yet. Run `leadsync sync` to fetch them.");
        } else {
            println!("No leads match the current filters.");
        }
        return Ok(());
    }

    for line in format_lead_lines(&page.leads) {
        println!("{line}");
    }
    println!(
        "Page {}/{} ({} leads)",
        page.page, page.total_pages, page.total
    );
    Ok(())
}
