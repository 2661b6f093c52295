use callcenter::api::{CmdMessage, MessageLevel, PageInfo, TechnicianContact};
use callcenter::config::CallCenterConfig;
use callcenter::model::{Employee, Job, Ticket};
use callcenter::paging::PageItem;
use callcenter::store::Stored;
use callcenter::text::time_left;
use chrono::{DateTime, Utc};
use colored::Colorize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const NUMBER_WIDTH: usize = 10;
const DEADLINE_WIDTH: usize = 22;

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

/// One listing row: number, customer and address, deadline on the right.
/// `deadline` is expected pre-padded to `DEADLINE_WIDTH`.
fn listing_line(number: &str, customer: &str, address: &str, deadline: &str) -> String {
    let number_col = format!("{:<width$}", number, width = NUMBER_WIDTH);
    let available = LINE_WIDTH.saturating_sub(NUMBER_WIDTH + 2 + DEADLINE_WIDTH);
    let middle = truncate_to_width(&format!("{}, {}", customer, address), available);
    let padding = " ".repeat(available.saturating_sub(middle.width()));
    format!("{}  {}{}{}", number_col, middle, padding, deadline)
}

// Pad before coloring; escape codes would throw off the alignment.
fn deadline_label(action_date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let label = time_left(action_date, now);
    let padded = format!("{:>width$}", label, width = DEADLINE_WIDTH);
    if action_date < now {
        padded.red().to_string()
    } else {
        padded.dimmed().to_string()
    }
}

pub(super) fn print_tickets(tickets: &[Stored<Ticket>], now: DateTime<Utc>) {
    if tickets.is_empty() {
        println!("No tickets found.");
        return;
    }
    for ticket in tickets {
        println!(
            "{}",
            listing_line(
                &ticket.ticket_number,
                &ticket.customer_name,
                &ticket.address,
                &deadline_label(ticket.action_date, now),
            )
        );
    }
}

pub(super) fn print_jobs(jobs: &[Stored<Job>], now: DateTime<Utc>) {
    if jobs.is_empty() {
        println!("No invoices found.");
        return;
    }
    for job in jobs {
        println!(
            "{}",
            listing_line(
                &job.ticket_number,
                &job.customer_name,
                &job.address,
                &deadline_label(job.action_date, now),
            )
        );
    }
}

/// `Page 3 of 12 (118 records)  1 … 2 [3] 4 5 … 12`
pub(super) fn render_page_footer(page: &PageInfo) -> String {
    let window = page
        .window
        .iter()
        .map(|item| match item {
            PageItem::Page(n) if *n == page.number => format!("[{}]", n),
            PageItem::Page(n) => n.to_string(),
            PageItem::Gap => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "Page {} of {} ({} records)  {}",
        page.number, page.total_pages, page.total_count, window
    )
    .trim_end()
    .to_string()
}

pub(super) fn print_page_footer(page: &PageInfo) {
    println!();
    println!("{}", render_page_footer(page).dimmed());
}

pub(super) fn print_ticket_detail(ticket: &Stored<Ticket>, now: DateTime<Utc>) {
    println!(
        "{} {}",
        format!("TN-{}", ticket.ticket_number).yellow(),
        ticket.ticket_status.as_str().bold()
    );
    println!("--------------------------------");
    println!("Customer:    {}", ticket.customer_name);
    println!("Phone:       {}", ticket.phone);
    println!("Address:     {}, apt {}", ticket.address, ticket.apartment);
    println!(
        "Scheduled:   {} {}",
        ticket.action_date.format("%Y-%m-%d"),
        ticket.action_time
    );
    println!("Deadline:    {}", time_left(ticket.action_date, now));
    println!("Technician:  {}", ticket.technician);
    println!("SC:          {}", ticket.sc);
    println!();
    println!("{}", ticket.description);
}

pub(super) fn print_job_detail(job: &Stored<Job>) {
    println!(
        "{} {} {}",
        format!("Invoice TN-{}", job.ticket_number).yellow(),
        job.ticket_status.as_str().bold(),
        job.status.dimmed()
    );
    println!("--------------------------------");
    println!("Customer:    {}", job.customer_name);
    println!("Address:     {}", job.address);
    println!("Technician:  {}", job.technician);
    println!("Parts:       {} ({:.2})", job.number_of_parts, job.parts_cost);
    println!("Payment:     {}", job.payment_type);
    println!("Total:       {:.2}", job.total_price);
}

pub(super) fn print_contact(contact: &TechnicianContact) {
    let phone = contact.phone_number.as_deref().unwrap_or("-");
    println!("{}  {}", contact.technician.bold(), phone);
    println!("{}", contact.message.dimmed());
}

pub(super) fn print_employees(employees: &[Stored<Employee>]) {
    if employees.is_empty() {
        println!("No employees found.");
        return;
    }
    for employee in employees {
        let name = truncate_to_width(&employee.name, 40);
        let padding = " ".repeat(40usize.saturating_sub(name.width()));
        println!(
            "{}{}{}",
            name,
            padding,
            employee.phone_number.as_deref().unwrap_or("").dimmed()
        );
    }
}

pub(super) fn print_config(config: &CallCenterConfig) {
    for key in CallCenterConfig::KEYS {
        if let Some(value) = config.get(key) {
            println!("{} = {}", key, value);
        }
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_wide_text_with_ellipsis() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        // two-column glyphs count double
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
    }

    #[test]
    fn listing_line_fits_line_width() {
        let line = listing_line(
            "AB123",
            "A customer with a remarkably long name indeed",
            "1200 Some Very Long Avenue Name, Springfield, Far Away County",
            &format!("{:>width$}", "Deadline in 3 days", width = DEADLINE_WIDTH),
        );
        assert_eq!(line.width(), LINE_WIDTH);
        assert!(line.starts_with("AB123     "));
        assert!(line.ends_with("Deadline in 3 days"));
    }

    #[test]
    fn footer_marks_current_page_and_gaps() {
        let page = PageInfo {
            number: 5,
            total_pages: 12,
            total_count: 118,
            window: vec![
                PageItem::Page(1),
                PageItem::Gap,
                PageItem::Page(4),
                PageItem::Page(5),
                PageItem::Page(6),
                PageItem::Gap,
                PageItem::Page(12),
            ],
        };
        assert_eq!(
            render_page_footer(&page),
            "Page 5 of 12 (118 records)  1 … 4 [5] 6 … 12"
        );
    }
}
