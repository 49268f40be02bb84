//! Text menu over the lending services
//!
//! Reads one answer per line from any `BufRead` and writes prompts and
//! results to any `Write`, so the same loop drives a terminal or a script.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookQuery, CreateBook, UpdateBook},
        member::{CreateMember, MemberQuery, UpdateMember},
    },
    services::Services,
};

const MENU: &str = "\
Books                 | Members                 | Loans                  | Search
----------------------+-------------------------+------------------------+----------------------
1. Add a book         | 5. Register a member    | 9. Borrow a book       | 12. Search books
2. View a book        | 6. View a member        | 10. Return a book      | 13. Search members
3. Update a book      | 7. Update a member      | 11. List member loans  | 14. Exit
4. Delete a book      | 8. Delete a member      |                        |
";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Shell<'a, R, W> {
    services: &'a Services,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(services: &'a Services, input: R, output: W) -> Self {
        Self {
            services,
            input,
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the menu until the operator exits or input ends
    pub async fn run(&mut self) -> AppResult<()> {
        loop {
            self.output.write_all(MENU.as_bytes())?;

            let Some(choice) = self.read_line("Choose an action: ")? else {
                break;
            };

            if choice.trim() == "14" {
                writeln!(self.output, "Goodbye!")?;
                break;
            }

            match self.dispatch(choice.trim()).await {
                Ok(()) => {}
                Err(AppError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(AppError::Io(e)) => return Err(AppError::Io(e)),
                Err(e) => {
                    tracing::debug!(error = %e, "operation failed");
                    writeln!(self.output, "Error [{}]: {}", e.code() as u32, e)?;
                }
            }
        }

        self.output.flush()?;
        Ok(())
    }

    async fn dispatch(&mut self, choice: &str) -> AppResult<()> {
        match choice {
            "1" => self.add_book().await,
            "2" => self.view_book().await,
            "3" => self.update_book().await,
            "4" => self.delete_book().await,
            "5" => self.register_member().await,
            "6" => self.view_member().await,
            "7" => self.update_member().await,
            "8" => self.delete_member().await,
            "9" => self.borrow_book().await,
            "10" => self.return_book().await,
            "11" => self.list_loans().await,
            "12" => self.search_books().await,
            "13" => self.search_members().await,
            _ => {
                writeln!(self.output, "Unknown choice, try again.")?;
                Ok(())
            }
        }
    }

    async fn add_book(&mut self) -> AppResult<()> {
        let id = self.ask_required("book ID")?;
        let title = self.ask("Title: ")?;
        let author = self.ask("Author: ")?;
        let copies = self.ask_required("number of copies")?;

        let book = self
            .services
            .catalog
            .add_book(CreateBook {
                id,
                title: title.trim().to_string(),
                author: author.trim().to_string(),
                copies,
            })
            .await?;
        writeln!(self.output, "Book added: {}", book)?;
        Ok(())
    }

    async fn view_book(&mut self) -> AppResult<()> {
        let id = self.ask_required("book ID")?;
        let book = self.services.catalog.get_book(id).await?;
        writeln!(self.output, "{}", book)?;
        Ok(())
    }

    async fn update_book(&mut self) -> AppResult<()> {
        let id = self.ask_required("book ID")?;
        let title = self.ask("New title (blank to keep): ")?;
        let author = self.ask("New author (blank to keep): ")?;
        let copies = self.ask("New number of copies (blank to keep): ")?;

        let patch = UpdateBook {
            title: optional_text(&title),
            author: optional_text(&author),
            copies: parse_optional("number of copies", &copies)?,
        };

        let book = self.services.catalog.update_book(id, patch).await?;
        writeln!(self.output, "Book updated: {}", book)?;
        Ok(())
    }

    async fn delete_book(&mut self) -> AppResult<()> {
        let id = self.ask_required("book ID")?;
        self.services.catalog.delete_book(id).await?;
        writeln!(self.output, "Book deleted.")?;
        Ok(())
    }

    async fn register_member(&mut self) -> AppResult<()> {
        let id = self.ask_required("member ID")?;
        let name = self.ask("Name: ")?;

        let member = self
            .services
            .members
            .register_member(CreateMember {
                id,
                name: name.trim().to_string(),
            })
            .await?;
        writeln!(self.output, "Member registered: {}", member)?;
        Ok(())
    }

    async fn view_member(&mut self) -> AppResult<()> {
        let id = self.ask_required("member ID")?;
        let member = self.services.members.get_member(id).await?;
        writeln!(self.output, "{}", member)?;
        Ok(())
    }

    async fn update_member(&mut self) -> AppResult<()> {
        let id = self.ask_required("member ID")?;
        let name = self.ask("New name (blank to keep): ")?;
        let reputation = self.ask("New reputation 0-100 (blank to keep): ")?;

        let patch = UpdateMember {
            name: optional_text(&name),
            reputation: parse_optional("reputation", &reputation)?,
        };

        let member = self.services.members.update_member(id, patch).await?;
        writeln!(self.output, "Member updated: {}", member)?;
        Ok(())
    }

    async fn delete_member(&mut self) -> AppResult<()> {
        let id = self.ask_required("member ID")?;
        self.services.members.delete_member(id).await?;
        writeln!(self.output, "Member deleted.")?;
        Ok(())
    }

    async fn borrow_book(&mut self) -> AppResult<()> {
        let member_id = self.ask_required("member ID")?;
        let book_id = self.ask_required("book ID")?;

        let loan = self.services.lending.borrow_book(member_id, book_id).await?;
        writeln!(
            self.output,
            "Book {} lent to member {}, due {}",
            loan.book_id,
            loan.member_id,
            loan.due_at.format(DATE_FORMAT)
        )?;
        Ok(())
    }

    async fn return_book(&mut self) -> AppResult<()> {
        let member_id = self.ask_required("member ID")?;
        let book_id = self.ask_required("book ID")?;
        let date = self.ask("Return date YYYY-MM-DD (blank for today): ")?;
        let lending = &self.services.lending;

        let receipt = match parse_return_date(&date)? {
            Some(day) => lending.return_book_on(member_id, book_id, day).await?,
            None => lending.return_book(member_id, book_id, None).await?,
        };

        if receipt.was_late() {
            writeln!(
                self.output,
                "Book returned {} day(s) late. Penalty +{} (total {}), reputation {}",
                receipt.overdue_days,
                receipt.penalty_accrued,
                receipt.penalty_total,
                receipt.reputation
            )?;
        } else {
            writeln!(
                self.output,
                "Book returned on time. Reputation {}",
                receipt.reputation
            )?;
        }
        Ok(())
    }

    async fn list_loans(&mut self) -> AppResult<()> {
        let member_id = self.ask_required("member ID")?;

        let open = self.services.lending.open_loan_count(member_id).await?;
        let loans = self.services.lending.list_loans(member_id).await?;

        if loans.is_empty() {
            writeln!(self.output, "Member {} has no loans.", member_id)?;
            return Ok(());
        }

        let now = self.services.lending.now();
        writeln!(self.output, "Open loans: {}", open)?;
        for loan in &loans {
            if loan.is_overdue(now) {
                writeln!(self.output, "{} (overdue)", loan)?;
            } else {
                writeln!(self.output, "{}", loan)?;
            }
        }
        Ok(())
    }

    async fn search_books(&mut self) -> AppResult<()> {
        let title = self.ask("Title contains (blank to skip): ")?;
        let author = self.ask("Author contains (blank to skip): ")?;
        let id = self.ask("Book ID (blank to skip): ")?;

        let query = BookQuery {
            title: optional_text(&title),
            author: optional_text(&author),
            id: parse_optional("book ID", &id)?,
        };

        let books = self.services.catalog.search_books(&query).await?;
        if books.is_empty() {
            writeln!(self.output, "No books found.")?;
        }
        for book in &books {
            writeln!(self.output, "{}", book)?;
        }
        Ok(())
    }

    async fn search_members(&mut self) -> AppResult<()> {
        let name = self.ask("Name contains (blank to skip): ")?;
        let id = self.ask("Member ID (blank to skip): ")?;

        let query = MemberQuery {
            name: optional_text(&name),
            id: parse_optional("member ID", &id)?,
        };

        let members = self.services.members.search_members(&query).await?;
        if members.is_empty() {
            writeln!(self.output, "No members found.")?;
        }
        for member in &members {
            writeln!(
                self.output,
                "ID: {}, Name: {}, Penalty: {}",
                member.id, member.name, member.penalty
            )?;
        }
        Ok(())
    }

    fn ask_required<T: FromStr>(&mut self, field: &str) -> AppResult<T> {
        let raw = self.ask(&format!("Enter {}: ", field))?;
        parse_required(field, &raw)
    }

    fn ask(&mut self, prompt: &str) -> AppResult<String> {
        self.read_line(prompt)?
            .ok_or_else(|| AppError::Io(io::Error::from(io::ErrorKind::UnexpectedEof)))
    }

    fn read_line(&mut self, prompt: &str) -> AppResult<Option<String>> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

fn parse_return_date(raw: &str) -> AppResult<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(Some)
        .map_err(|_| AppError::invalid_input("return date"))
}

fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_required<T: FromStr>(field: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::invalid_input(field))
}

fn parse_optional<T: FromStr>(field: &str, raw: &str) -> AppResult<Option<T>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_required(field, raw).map(Some)
}
