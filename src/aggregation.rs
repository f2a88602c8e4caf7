//! Totals, balances and per-category breakdowns over a user's transactions.
//!
//! Every function here is pure: the caller loads the transactions (and the
//! category catalog where names are needed) and the results are computed with
//! exact decimal arithmetic.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use time::{Date, Month};

use crate::{
    Error,
    category::{Category, CategoryId},
    transaction::{Transaction, TransactionType},
};

fn sum_of_type<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    transaction_type: TransactionType,
) -> Decimal {
    transactions
        .into_iter()
        .filter(|transaction| transaction.transaction_type == transaction_type)
        .map(|transaction| transaction.amount.value())
        .sum()
}

/// The sum of all incomes, zero if there are none.
pub fn total_income(transactions: &[Transaction]) -> Decimal {
    sum_of_type(transactions, TransactionType::Income)
}

/// The sum of all expenses, zero if there are none.
pub fn total_expenses(transactions: &[Transaction]) -> Decimal {
    sum_of_type(transactions, TransactionType::Expense)
}

/// Total income minus total expenses, negative when more was spent than earned.
pub fn balance(transactions: &[Transaction]) -> Decimal {
    total_income(transactions) - total_expenses(transactions)
}

/// A closed range of dates, both ends included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    /// The first day of the period.
    pub start: Date,
    /// The last day of the period.
    pub end: Date,
}

impl Period {
    /// Create the period from `start` to `end` inclusive.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidPeriod] if `start` is after `end`.
    pub fn new(start: Date, end: Date) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidPeriod);
        }

        Ok(Self { start, end })
    }

    /// Whether `date` falls on or between the start and end of the period.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The sum of incomes dated within `period`.
pub fn income_by_period(transactions: &[Transaction], period: &Period) -> Decimal {
    sum_of_type(
        transactions
            .iter()
            .filter(|transaction| period.contains(transaction.date)),
        TransactionType::Income,
    )
}

/// The sum of expenses dated within `period`.
pub fn expenses_by_period(transactions: &[Transaction], period: &Period) -> Decimal {
    sum_of_type(
        transactions
            .iter()
            .filter(|transaction| period.contains(transaction.date)),
        TransactionType::Expense,
    )
}

/// Expense totals per category as two parallel lists, ready for charting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryBreakdown {
    /// The category names.
    pub names: Vec<String>,
    /// The total spent in the category with the same index in `names`.
    pub values: Vec<Decimal>,
}

impl CategoryBreakdown {
    /// Iterate over (name, total) pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// The sum of all category totals.
    pub fn total(&self) -> Decimal {
        self.values.iter().sum()
    }

    /// Whether there are no categories in the breakdown.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn push(&mut self, name: String, value: Decimal) {
        self.names.push(name);
        self.values.push(value);
    }
}

/// Sum expenses per category in the order categories first appear in `transactions`.
///
/// Categories without expenses are left out. Expenses filed under a category
/// that is not in `categories` are skipped.
pub fn expenses_by_category(
    transactions: &[Transaction],
    categories: &[Category],
) -> CategoryBreakdown {
    let names: HashMap<CategoryId, &str> = categories
        .iter()
        .map(|category| (category.id, category.name.as_ref()))
        .collect();

    let mut order: Vec<CategoryId> = Vec::new();
    let mut totals: HashMap<CategoryId, Decimal> = HashMap::new();

    for transaction in transactions {
        if transaction.transaction_type != TransactionType::Expense
            || !names.contains_key(&transaction.category_id)
        {
            continue;
        }

        let total = totals.entry(transaction.category_id).or_insert_with(|| {
            order.push(transaction.category_id);
            Decimal::ZERO
        });
        *total += transaction.amount.value();
    }

    let mut breakdown = CategoryBreakdown::default();

    for category_id in order {
        let total = totals[&category_id];

        if total > Decimal::ZERO {
            breakdown.push(names[&category_id].to_owned(), total);
        }
    }

    breakdown
}

/// A calendar month, e.g. "2024-01".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    first_day: Date,
}

impl YearMonth {
    /// Create a year-month.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidMonth] if the year is out of range.
    pub fn new(year: i32, month: Month) -> Result<Self, Error> {
        Date::from_calendar_date(year, month, 1)
            .map(|first_day| Self { first_day })
            .map_err(|_| Error::InvalidMonth(format!("{year:04}-{:02}", month as u8)))
    }

    /// The month containing `date`.
    pub fn from_date(date: Date) -> Self {
        Self {
            first_day: date.replace_day(1).unwrap_or(date),
        }
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// The month of the year.
    pub fn month(&self) -> Month {
        self.first_day.month()
    }

    /// The first day of the month.
    pub fn first_day(&self) -> Date {
        self.first_day
    }

    /// The last day of the month.
    pub fn last_day(&self) -> Date {
        (28..=31)
            .rev()
            .find_map(|day| self.first_day.replace_day(day).ok())
            .unwrap_or(self.first_day)
    }

    /// Every day of the month.
    pub fn period(&self) -> Period {
        Period {
            start: self.first_day(),
            end: self.last_day(),
        }
    }

    /// The month before this one, `None` at the start of the calendar.
    pub fn previous(&self) -> Option<Self> {
        self.first_day.previous_day().map(Self::from_date)
    }

    /// The month after this one, `None` at the end of the calendar.
    pub fn next(&self) -> Option<Self> {
        self.last_day().next_day().map(Self::from_date)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    /// Parse a month in the format "YYYY-MM".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonth(s.to_owned());

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;

        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;

        YearMonth::new(year, month)
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month() as u8)
    }
}

/// The income, expenses and spending per category for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReport<'a> {
    /// The month the report covers.
    pub year_month: YearMonth,
    /// The sum of incomes dated within the month.
    pub income: Decimal,
    /// The sum of expenses dated within the month.
    pub expenses: Decimal,
    /// `income - expenses`.
    pub balance: Decimal,
    /// The transactions dated within the month, in the order they were given.
    pub transactions: Vec<&'a Transaction>,
    /// Expenses per category, in catalog order, for categories that spent more than zero.
    pub breakdown: CategoryBreakdown,
}

/// Build the report for `year_month`.
///
/// Unlike [expenses_by_category], the breakdown walks the category catalog,
/// so its order follows `categories` and only categories that still exist are
/// included.
pub fn monthly_report<'a>(
    transactions: &'a [Transaction],
    categories: &[Category],
    year_month: YearMonth,
) -> MonthlyReport<'a> {
    let period = year_month.period();

    let income = income_by_period(transactions, &period);
    let expenses = expenses_by_period(transactions, &period);

    let in_month = transactions
        .iter()
        .filter(|transaction| period.contains(transaction.date))
        .collect::<Vec<_>>();

    let mut breakdown = CategoryBreakdown::default();

    for category in categories {
        let spent = sum_of_type(
            in_month
                .iter()
                .copied()
                .filter(|transaction| transaction.category_id == category.id),
            TransactionType::Expense,
        );

        if spent > Decimal::ZERO {
            breakdown.push(category.name.to_string(), spent);
        }
    }

    MonthlyReport {
        year_month,
        income,
        expenses,
        balance: income - expenses,
        transactions: in_month,
        breakdown,
    }
}
